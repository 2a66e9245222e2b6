use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::models::{FileType, ReviewStatus, Role, UploadedFile, User};

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq, Eq, Default)]
pub struct MonthlyStats {
    /// Calendar month as `YYYY-MM`
    pub month: String,
    pub videos: usize,
    pub scripts: usize,
    pub voices: usize,
    pub total: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TypeTotals {
    pub videos: usize,
    pub scripts: usize,
    pub voices: usize,
}

impl TypeTotals {
    fn count(&mut self, file_type: FileType) {
        match file_type {
            FileType::Video => self.videos += 1,
            FileType::Script => self.scripts += 1,
            FileType::Voice => self.voices += 1,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq, Eq)]
pub struct Contributor {
    pub name: String,
    pub count: usize,
}

pub fn month_key(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m").to_string()
}

/// One record per calendar month present in `files`, oldest month first.
pub fn monthly_stats(files: &[UploadedFile]) -> Vec<MonthlyStats> {
    let mut months: BTreeMap<String, TypeTotals> = BTreeMap::new();
    for file in files {
        months.entry(month_key(&file.upload_date)).or_default().count(file.file_type);
    }

    months
        .into_iter()
        .map(|(month, totals)| MonthlyStats {
            month,
            videos: totals.videos,
            scripts: totals.scripts,
            voices: totals.voices,
            total: totals.videos + totals.scripts + totals.voices,
        })
        .collect()
}

pub fn totals_by_type(files: &[UploadedFile]) -> TypeTotals {
    let mut totals = TypeTotals::default();
    for file in files {
        totals.count(file.file_type);
    }
    totals
}

/// Stats for the month containing `now`, zeroed when nothing was uploaded.
pub fn current_month(stats: &[MonthlyStats], now: &DateTime<Utc>) -> MonthlyStats {
    let month = month_key(now);
    stats
        .iter()
        .find(|stat| stat.month == month)
        .cloned()
        .unwrap_or(MonthlyStats { month, ..Default::default() })
}

/// Uploaders by file count, ties kept in order of first appearance.
pub fn top_contributors(files: &[UploadedFile], limit: usize) -> Vec<Contributor> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut contributors: Vec<Contributor> = Vec::new();

    for file in files {
        let position = *positions.entry(file.uploaded_by.as_str()).or_insert_with(|| {
            contributors.push(Contributor { name: file.uploaded_by_name.clone(), count: 0 });
            contributors.len() - 1
        });
        contributors[position].count += 1;
    }

    // sort_by is stable, so equal counts keep insertion order
    contributors.sort_by(|a, b| b.count.cmp(&a.count));
    contributors.truncate(limit);
    contributors
}

pub fn recent_files(files: &[UploadedFile], limit: usize) -> Vec<UploadedFile> {
    files
        .iter()
        .sorted_by(|a, b| b.upload_date.cmp(&a.upload_date))
        .take(limit)
        .cloned()
        .collect()
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated: DateTime<Utc>,
    pub total_files: usize,
    pub total_users: usize,
    pub monthly_stats: Vec<MonthlyStats>,
    pub total_by_type: TypeTotals,
    pub top_contributors: Vec<Contributor>,
    pub this_month: MonthlyStats,
}

pub fn build_report(files: &[UploadedFile], total_users: usize, now: DateTime<Utc>, contributor_limit: usize) -> Report {
    let monthly_stats = monthly_stats(files);
    let this_month = current_month(&monthly_stats, &now);

    Report {
        generated: now,
        total_files: files.len(),
        total_users,
        total_by_type: totals_by_type(files),
        top_contributors: top_contributors(files, contributor_limit),
        monthly_stats,
        this_month,
    }
}

/// Downloadable form of a [`Report`]: the same figures without `thisMonth`.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub generated: DateTime<Utc>,
    pub total_files: usize,
    pub total_users: usize,
    pub monthly_stats: Vec<MonthlyStats>,
    pub total_by_type: TypeTotals,
    pub top_contributors: Vec<Contributor>,
}

impl From<Report> for ReportDocument {
    fn from(report: Report) -> Self {
        ReportDocument {
            generated: report.generated,
            total_files: report.total_files,
            total_users: report.total_users,
            monthly_stats: report.monthly_stats,
            total_by_type: report.total_by_type,
            top_contributors: report.top_contributors,
        }
    }
}

pub fn report_filename(now: &DateTime<Utc>) -> String {
    format!("teamfocuz-report-{}.json", now.format("%Y-%m-%d"))
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq, Eq)]
pub struct StatCard {
    pub title: String,
    pub value: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub greeting: String,
    pub name: String,
    pub role: Role,
    pub role_label: String,
    pub cards: Vec<StatCard>,
    pub unread_notifications: usize,
    pub recent_files: Vec<UploadedFile>,
}

/// Hour of `now` as seen by a viewer `utc_offset_minutes` east of UTC.
/// Missing or out of range offsets fall back to UTC.
pub fn local_hour(now: &DateTime<Utc>, utc_offset_minutes: Option<i32>) -> u32 {
    match utc_offset_minutes
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(FixedOffset::east_opt)
    {
        Some(offset) => now.with_timezone(&offset).hour(),
        None => now.hour()
    }
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening"
    }
}

fn card(title: &str, value: usize) -> StatCard {
    StatCard { title: title.to_string(), value }
}

fn count_pending<'a>(files: impl Iterator<Item = &'a UploadedFile>) -> usize {
    files.filter(|file| file.status == ReviewStatus::Pending).count()
}

/// Role specific summary cards. Uploaders only count their own files.
pub fn stat_cards(user: &User, user_count: usize, files: &[UploadedFile]) -> Vec<StatCard> {
    let (file_type, title) = match user.role {
        Role::Admin => {
            return vec![
                card("Total Users", user_count),
                card("Total Files", files.len()),
                card("Pending Reviews", count_pending(files.iter())),
            ]
        },
        Role::VideoEditor => (FileType::Video, "Videos Uploaded"),
        Role::ScriptWriter => (FileType::Script, "Scripts Uploaded"),
        Role::VoiceArtist => (FileType::Voice, "Voice Files Uploaded"),
    };

    let own = files.iter().filter(|file| file.uploaded_by == user.id).collect::<Vec<_>>();
    vec![
        card(title, own.iter().filter(|file| file.file_type == file_type).count()),
        card("Pending Review", count_pending(own.iter().copied())),
    ]
}

pub fn dashboard(user: &User, user_count: usize, files: &[UploadedFile], unread_notifications: usize, local_hour: u32, recent_limit: usize) -> Dashboard {
    Dashboard {
        greeting: greeting(local_hour).to_string(),
        name: user.name.clone(),
        role: user.role,
        role_label: user.role.label().to_string(),
        cards: stat_cards(user, user_count, files),
        unread_notifications,
        recent_files: recent_files(files, recent_limit),
    }
}
