use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration
};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rocket::tokio::{self, task::JoinHandle};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::{
    database_utils::StoreExtension,
    models::{FileType, NewFile, Role, User},
    store::{FileAction, FileEvent, FileStore}
};
use crate::utils::normalize_filename;

/// What a role may upload and how the upload is classified.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct UploadPolicy {
    pub file_type: FileType,
    /// Accepted MIME types, empty accepts anything
    pub accepted_types: Vec<&'static str>,
    pub label: &'static str,
}

impl UploadPolicy {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::VideoEditor => UploadPolicy {
                file_type: FileType::Video,
                accepted_types: vec!["video/mp4", "video/avi", "video/quicktime", "video/x-ms-wmv", "video/x-flv", "video/webm"],
                label: "Video Files (MP4, AVI, MOV, WMV, FLV, WebM)",
            },
            Role::ScriptWriter => UploadPolicy {
                file_type: FileType::Script,
                accepted_types: vec![
                    "application/pdf",
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    "text/plain"
                ],
                label: "Document Files (PDF, DOC, DOCX, TXT)",
            },
            Role::VoiceArtist => UploadPolicy {
                file_type: FileType::Voice,
                accepted_types: vec!["audio/mp3", "audio/mpeg", "audio/wav", "audio/aac", "audio/flac", "audio/ogg"],
                label: "Audio Files (MP3, WAV, AAC, FLAC, OGG)",
            },
            Role::Admin => UploadPolicy {
                file_type: FileType::Script,
                accepted_types: Vec::new(),
                label: "All Files",
            },
        }
    }

    pub fn accepts(&self, mime_type: &str) -> bool {
        self.accepted_types.is_empty() || self.accepted_types.contains(&mime_type)
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct UploadItem {
    #[schema(example = "Episode 2 Rough Cut.mp4")]
    pub name: String,
    /// Size in bytes
    pub size: u64,
    #[schema(example = "video/mp4")]
    pub mime_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum UploadRejection {
    NothingAccepted,
    TooLarge { name: String, limit_mb: u64 },
}

/// Drops items the policy does not accept, then checks the size limit (0 = none).
pub fn prepare_files(uploader: &User, items: Vec<UploadItem>, max_size_mb: u64) -> Result<Vec<NewFile>, UploadRejection> {
    let policy = UploadPolicy::for_role(uploader.role);
    let accepted = items
        .into_iter()
        .filter(|item| policy.accepts(&item.mime_type))
        .collect::<Vec<_>>();

    if accepted.is_empty() {
        return Err(UploadRejection::NothingAccepted);
    }

    if max_size_mb > 0 {
        let limit = max_size_mb.saturating_mul(1024 * 1024);
        if let Some(item) = accepted.iter().find(|item| item.size > limit) {
            return Err(UploadRejection::TooLarge { name: item.name.clone(), limit_mb: max_size_mb });
        }
    }

    Ok(accepted
        .into_iter()
        .map(|item| NewFile {
            filename: normalize_filename(&item.name),
            original_name: item.name,
            file_type: policy.file_type,
            size: item.size,
            uploaded_by: uploader.id.clone(),
            uploaded_by_name: uploader.name.clone(),
            mime_type: item.mime_type,
            notes: item.notes,
        })
        .collect())
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    Uploading,
    Completed,
    Cancelled,
    Failed,
}

struct UploadJob {
    owner_id: String,
    state: UploadState,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    pending_files: Vec<NewFile>,
    file_count: usize,
    file_ids: Vec<String>,
    task: Option<JoinHandle<()>>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct UploadJobInfo {
    pub id: String,
    pub owner_id: String,
    pub state: UploadState,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub file_count: usize,
    /// Registry ids, filled in once the upload completes
    pub file_ids: Vec<String>,
}

const DEFAULT_RETENTION_SECS: u64 = 600;

/// Simulated uploads in flight and their outcome. Finished jobs are kept
/// for the retention period so their owner can still poll them.
pub struct UploadTracker {
    jobs: HashMap<String, UploadJob>,
    retention: chrono::Duration,
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION_SECS)
    }
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention_secs: u64) -> Self {
        let retention = chrono::Duration::from_std(Duration::from_secs(retention_secs))
            .unwrap_or_else(|_| chrono::Duration::max_value());
        UploadTracker { jobs: HashMap::new(), retention }
    }

    /// Drops finished jobs whose retention ran out by `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = match now.checked_sub_signed(self.retention) {
            Some(cutoff) => cutoff,
            None => return 0
        };

        let before = self.jobs.len();
        self.jobs.retain(|_, job| match job.finished_at {
            Some(finished_at) => finished_at > cutoff,
            None => true
        });

        let pruned = before - self.jobs.len();
        if pruned > 0 {
            debug!("Pruned {} finished upload(s)", pruned);
        }
        pruned
    }

    pub fn start(&mut self, id: String, owner_id: String, files: Vec<NewFile>) -> UploadJobInfo {
        self.prune(Utc::now());
        let job = UploadJob {
            owner_id,
            state: UploadState::Uploading,
            created_at: Utc::now(),
            finished_at: None,
            file_count: files.len(),
            pending_files: files,
            file_ids: Vec::new(),
            task: None,
        };
        let info = Self::info(&id, &job);
        self.jobs.insert(id, job);
        info
    }

    pub fn attach(&mut self, id: &str, task: JoinHandle<()>) {
        match self.jobs.get_mut(id) {
            Some(job) if job.state == UploadState::Uploading => job.task = Some(task),
            _ => {}
        }
    }

    pub fn get(&self, id: &str) -> Option<UploadJobInfo> {
        self.jobs.get(id).map(|job| Self::info(id, job))
    }

    /// Stops an upload that has not completed yet. Returns `None` for unknown jobs.
    pub fn cancel(&mut self, id: &str) -> Option<UploadJobInfo> {
        let job = self.jobs.get_mut(id)?;
        if job.state == UploadState::Uploading {
            if let Some(task) = job.task.take() {
                task.abort();
            }
            job.state = UploadState::Cancelled;
            job.finished_at = Some(Utc::now());
            job.pending_files.clear();
            info!("Cancelled upload {}", id);
        }
        Some(Self::info(id, job))
    }

    fn take_pending(&mut self, id: &str) -> Option<Vec<NewFile>> {
        let job = self.jobs.get_mut(id)?;
        if job.state != UploadState::Uploading {
            return None;
        }
        job.task = None;
        Some(std::mem::take(&mut job.pending_files))
    }

    fn finish(&mut self, id: &str, state: UploadState, file_ids: Vec<String>) {
        if let Some(job) = self.jobs.get_mut(id) {
            job.state = state;
            job.finished_at = Some(Utc::now());
            job.file_ids = file_ids;
        }
    }

    fn info(id: &str, job: &UploadJob) -> UploadJobInfo {
        UploadJobInfo {
            id: id.to_string(),
            owner_id: job.owner_id.clone(),
            state: job.state,
            created_at: job.created_at,
            finished_at: job.finished_at,
            file_count: job.file_count,
            file_ids: job.file_ids.clone(),
        }
    }
}

/// Moves an uploading job's files into the registry. A job that was
/// cancelled or already finished is left alone.
pub fn complete_upload(tracker: &Mutex<UploadTracker>, files: &Mutex<FileStore>, id: &str) -> Option<UploadState> {
    let mut tracker = match tracker.lock() {
        Ok(result) => result,
        Err(err) => {
            error!("Failed to lock upload tracker, {}", err);
            return None;
        }
    };
    let pending = tracker.take_pending(id)?;

    let mut registry = match files.lock() {
        Ok(result) => result,
        Err(err) => {
            error!("Failed to lock file registry, {}", err);
            tracker.finish(id, UploadState::Failed, Vec::new());
            return Some(UploadState::Failed);
        }
    };

    let mut file_ids = Vec::with_capacity(pending.len());
    for new_file in pending {
        match registry.dispatch(FileAction::Add(new_file)) {
            Ok(FileEvent::Added(file)) => file_ids.push(file.id),
            Ok(_) => {},
            Err(err) => {
                warn!("Upload {} failed, {}", id, err);
                tracker.finish(id, UploadState::Failed, file_ids);
                return Some(UploadState::Failed);
            }
        }
    }

    info!("Upload {} completed with {} file(s)", id, file_ids.len());
    tracker.finish(id, UploadState::Completed, file_ids);
    Some(UploadState::Completed)
}

/// Schedules completion after `delay`; the returned job can be cancelled until then.
pub fn schedule_upload(
    tracker: &Arc<Mutex<UploadTracker>>,
    files: &Arc<Mutex<FileStore>>,
    id: String,
    owner_id: String,
    new_files: Vec<NewFile>,
    delay: Duration
) -> Result<UploadJobInfo, crate::Error> {
    let info = tracker.acquire()?.start(id.clone(), owner_id, new_files);

    let task_tracker = Arc::clone(tracker);
    let task_files = Arc::clone(files);
    let task_id = id.clone();
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        complete_upload(&task_tracker, &task_files, &task_id);
    });

    tracker.acquire()?.attach(&id, task);
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader(role: Role) -> User {
        User {
            id: String::from("2"),
            username: String::from("veditor"),
            email: String::from("editor@teamfocuz.com"),
            role,
            name: String::from("Alex Johnson"),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn item(name: &str, mime_type: &str, size: u64) -> UploadItem {
        UploadItem { name: name.to_string(), size, mime_type: mime_type.to_string(), notes: None }
    }

    #[test]
    fn policy_per_role() {
        assert_eq!(UploadPolicy::for_role(Role::VideoEditor).file_type, FileType::Video);
        assert_eq!(UploadPolicy::for_role(Role::ScriptWriter).file_type, FileType::Script);
        assert_eq!(UploadPolicy::for_role(Role::VoiceArtist).file_type, FileType::Voice);
        assert!(UploadPolicy::for_role(Role::VoiceArtist).accepts("audio/flac"));
        assert!(!UploadPolicy::for_role(Role::VoiceArtist).accepts("video/mp4"));
        assert!(UploadPolicy::for_role(Role::Admin).accepts("application/zip"));
    }

    #[test]
    fn unaccepted_types_are_dropped() {
        let items = vec![item("Cut 1.mp4", "video/mp4", 10), item("notes.txt", "text/plain", 10)];
        let files = prepare_files(&uploader(Role::VideoEditor), items, 0).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "cut_1.mp4");
        assert_eq!(files[0].original_name, "Cut 1.mp4");
        assert_eq!(files[0].uploaded_by_name, "Alex Johnson");
    }

    #[test]
    fn rejects_empty_or_oversized_batches() {
        let editor = uploader(Role::VideoEditor);
        assert_eq!(
            prepare_files(&editor, vec![item("a.txt", "text/plain", 1)], 0),
            Err(UploadRejection::NothingAccepted)
        );
        assert_eq!(
            prepare_files(&editor, vec![item("big.mp4", "video/mp4", 3 * 1024 * 1024)], 2),
            Err(UploadRejection::TooLarge { name: String::from("big.mp4"), limit_mb: 2 })
        );
    }

    #[test]
    fn completion_registers_files_once() {
        let tracker = Mutex::new(UploadTracker::new());
        let files = Mutex::new(FileStore::new(8));
        let batch = prepare_files(&uploader(Role::VideoEditor), vec![item("a.mp4", "video/mp4", 1), item("b.mp4", "video/mp4", 1)], 0).unwrap();
        tracker.lock().unwrap().start(String::from("job"), String::from("2"), batch);

        assert_eq!(complete_upload(&tracker, &files, "job"), Some(UploadState::Completed));
        assert_eq!(complete_upload(&tracker, &files, "job"), None);

        let info = tracker.lock().unwrap().get("job").unwrap();
        assert_eq!(info.state, UploadState::Completed);
        assert_eq!(info.file_ids.len(), 2);
        assert_eq!(files.lock().unwrap().files().len(), 2);
        assert_eq!(files.lock().unwrap().notifications().len(), 2);
    }

    #[test]
    fn cancelled_upload_never_registers() {
        let tracker = Mutex::new(UploadTracker::new());
        let files = Mutex::new(FileStore::new(8));
        let batch = prepare_files(&uploader(Role::VoiceArtist), vec![item("take.mp3", "audio/mp3", 1)], 0).unwrap();
        tracker.lock().unwrap().start(String::from("job"), String::from("4"), batch);

        let info = tracker.lock().unwrap().cancel("job").unwrap();
        assert_eq!(info.state, UploadState::Cancelled);
        assert_eq!(complete_upload(&tracker, &files, "job"), None);
        assert!(files.lock().unwrap().files().is_empty());
        assert!(tracker.lock().unwrap().cancel("missing").is_none());
    }

    #[test]
    fn huge_size_limit_does_not_overflow() {
        let editor = uploader(Role::VideoEditor);
        let files = prepare_files(&editor, vec![item("long.mp4", "video/mp4", u64::MAX)], u64::MAX).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn finished_jobs_are_pruned_after_retention() {
        let mut tracker = UploadTracker::with_retention(60);
        tracker.start(String::from("done"), String::from("2"), Vec::new());
        tracker.start(String::from("running"), String::from("2"), Vec::new());
        tracker.cancel("done");

        assert_eq!(tracker.prune(Utc::now()), 0);
        assert!(tracker.get("done").is_some());

        assert_eq!(tracker.prune(Utc::now() + chrono::Duration::seconds(61)), 1);
        assert!(tracker.get("done").is_none());
        assert_eq!(tracker.get("running").unwrap().state, UploadState::Uploading);
    }

    #[test]
    fn starting_a_job_drops_expired_ones() {
        let mut tracker = UploadTracker::with_retention(0);
        tracker.start(String::from("old"), String::from("2"), Vec::new());
        tracker.cancel("old");

        tracker.start(String::from("new"), String::from("2"), Vec::new());
        assert!(tracker.get("old").is_none());
        assert!(tracker.get("new").is_some());
    }
}
