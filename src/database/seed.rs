use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::info;

use crate::database::{
    models::{FileType, Notification, ReviewStatus, Role, Severity, UploadedFile, User},
    store::{FileStore, StoreError, UserStore}
};

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    let midnight = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    Utc.from_utc_datetime(&midnight)
}

fn account(id: &str, username: &str, email: &str, role: Role, name: &str, created_at: DateTime<Utc>) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        role,
        name: name.to_string(),
        created_at,
        last_login: None,
    }
}

/// Demo team: one administrator and one account per uploader role.
pub fn seed_users(store: &mut UserStore, password: &str) -> Result<(), StoreError> {
    let users = [
        account("1", "admin", "admin@teamfocuz.com", Role::Admin, "System Administrator", date(2024, 1, 1)),
        account("2", "veditor", "editor@teamfocuz.com", Role::VideoEditor, "Alex Johnson", date(2024, 1, 15)),
        account("3", "swriter", "writer@teamfocuz.com", Role::ScriptWriter, "Sarah Chen", date(2024, 1, 20)),
        account("4", "vartist", "voice@teamfocuz.com", Role::VoiceArtist, "Michael Rodriguez", date(2024, 2, 1)),
    ];

    for user in users {
        store.insert(user, password)?;
    }
    info!("Seeded {} demo accounts", store.len());
    Ok(())
}

pub fn seed_files(store: &mut FileStore) {
    let files = [
        UploadedFile {
            id: String::from("1"),
            filename: String::from("project_intro.mp4"),
            original_name: String::from("Project Introduction Video.mp4"),
            file_type: FileType::Video,
            size: 157286400,
            uploaded_by: String::from("2"),
            uploaded_by_name: String::from("Alex Johnson"),
            upload_date: date(2024, 12, 1),
            status: ReviewStatus::Approved,
            mime_type: String::from("video/mp4"),
            notes: None,
        },
        UploadedFile {
            id: String::from("2"),
            filename: String::from("episode_1_script.pdf"),
            original_name: String::from("Episode 1 Script - Final Draft.pdf"),
            file_type: FileType::Script,
            size: 2048000,
            uploaded_by: String::from("3"),
            uploaded_by_name: String::from("Sarah Chen"),
            upload_date: date(2024, 12, 2),
            status: ReviewStatus::Approved,
            mime_type: String::from("application/pdf"),
            notes: None,
        },
        UploadedFile {
            id: String::from("3"),
            filename: String::from("narration_sample.mp3"),
            original_name: String::from("Narration Sample - Take 1.mp3"),
            file_type: FileType::Voice,
            size: 5242880,
            uploaded_by: String::from("4"),
            uploaded_by_name: String::from("Michael Rodriguez"),
            upload_date: date(2024, 12, 3),
            status: ReviewStatus::Pending,
            mime_type: String::from("audio/mp3"),
            notes: None,
        },
    ];

    for file in files {
        store.insert(file);
    }
    store.insert_notification(Notification {
        id: String::from("1"),
        message: String::from("New voice file uploaded by Michael Rodriguez"),
        severity: Severity::Info,
        timestamp: Utc::now(),
        read: false,
    });
    info!("Seeded {} demo files", store.files().len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_one_account_per_role() {
        let mut store = UserStore::new(8);
        seed_users(&mut store, "password123").unwrap();

        let roles: Vec<Role> = store.all().iter().map(|user| user.role).collect();
        assert_eq!(roles, Role::ALL.to_vec());
        assert!(store.authenticate("admin", "password123", Utc::now()).is_some());
    }

    #[test]
    fn seeds_december_files() {
        let mut store = FileStore::new(8);
        seed_files(&mut store);

        assert_eq!(store.files().len(), 3);
        assert!(store.files().iter().all(|file| file.upload_date.format("%Y-%m").to_string() == "2024-12"));
        assert_eq!(store.unread_count(), 1);
    }
}
