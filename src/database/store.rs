use chrono::{DateTime, Utc};
use log::{debug, info};
use pbkdf2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString
    },
    Pbkdf2
};
use thiserror::Error;

use crate::database::models::{
    FileType, NewFile, Notification, ReviewStatus, Role, Severity, UploadedFile, User
};
use crate::utils::generate_id;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("No user exists with id {0}")]
    UserNotFound(String),
    #[error("No file exists with id {0}")]
    FileNotFound(String),
    #[error("No notification exists with id {0}")]
    NotificationNotFound(String),
    #[error("Username is already in use!")]
    UsernameTaken(String),
    #[error("Cannot move a {from} file to {to}, only pending files can be reviewed")]
    InvalidTransition { from: &'static str, to: &'static str },
    #[error("Failed to hash password")]
    PasswordHash,
    #[error("Session store failure: {0}")]
    Session(String),
}

struct Account {
    profile: User,
    password_hash: String,
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| StoreError::PasswordHash)
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub password: String,
}

/// Partial update; `None` leaves the field as is.
#[derive(Clone, Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub name: Option<String>,
    pub password: Option<String>,
}

pub enum UserAction {
    Add(NewUser),
    Update { id: String, changes: UserChanges },
    Delete { id: String },
    RecordLogin { id: String, at: DateTime<Utc> },
}

#[derive(Debug, PartialEq)]
pub enum UserEvent {
    Added(User),
    Updated(User),
    Deleted(User),
    LoggedIn(User),
}

/// Directory of accounts for the lifetime of the process.
pub struct UserStore {
    accounts: Vec<Account>,
    id_length: usize,
}

impl UserStore {
    pub fn new(id_length: usize) -> Self {
        UserStore { accounts: Vec::new(), id_length }
    }

    /// Inserts a profile as is, keeping its id and timestamps.
    pub fn insert(&mut self, profile: User, password: &str) -> Result<(), StoreError> {
        if self.find_by_username(&profile.username).is_some() {
            return Err(StoreError::UsernameTaken(profile.username));
        }
        let password_hash = hash_password(password)?;
        self.accounts.push(Account { profile, password_hash });
        Ok(())
    }

    pub fn all(&self) -> Vec<User> {
        self.accounts.iter().map(|account| account.profile.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.accounts.iter().map(|account| &account.profile).find(|user| user.id == id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        self.accounts.iter().map(|account| &account.profile).find(|user| user.username == username)
    }

    /// Placeholder credential check; refreshes the last login on success.
    pub fn authenticate(&mut self, username: &str, password: &str, now: DateTime<Utc>) -> Option<User> {
        let account = self.accounts.iter().find(|account| account.profile.username == username)?;
        if !verify_password(password, &account.password_hash) {
            debug!("Rejected login for {}", username);
            return None;
        }

        let id = account.profile.id.clone();
        match self.dispatch(UserAction::RecordLogin { id, at: now }) {
            Ok(UserEvent::LoggedIn(user)) => Some(user),
            _ => None
        }
    }

    pub fn dispatch(&mut self, action: UserAction) -> Result<UserEvent, StoreError> {
        match action {
            UserAction::Add(new_user) => {
                let profile = User {
                    id: generate_id(self.id_length),
                    username: new_user.username,
                    email: new_user.email,
                    role: new_user.role,
                    name: new_user.name,
                    created_at: Utc::now(),
                    last_login: None,
                };
                self.insert(profile.clone(), &new_user.password)?;
                info!("Added {} account {}", profile.role, profile.username);
                Ok(UserEvent::Added(profile))
            },
            UserAction::Update { id, changes } => {
                if let Some(username) = &changes.username {
                    if self.accounts.iter().any(|account| &account.profile.username == username && account.profile.id != id) {
                        return Err(StoreError::UsernameTaken(username.clone()));
                    }
                }
                let password_hash = match &changes.password {
                    Some(password) => Some(hash_password(password)?),
                    None => None
                };

                let account = self.account_mut(&id)?;
                if let Some(username) = changes.username {
                    account.profile.username = username;
                }
                if let Some(email) = changes.email {
                    account.profile.email = email;
                }
                if let Some(role) = changes.role {
                    account.profile.role = role;
                }
                if let Some(name) = changes.name {
                    account.profile.name = name;
                }
                if let Some(password_hash) = password_hash {
                    account.password_hash = password_hash;
                }
                Ok(UserEvent::Updated(account.profile.clone()))
            },
            UserAction::Delete { id } => {
                let position = self.accounts
                    .iter()
                    .position(|account| account.profile.id == id)
                    .ok_or(StoreError::UserNotFound(id))?;
                let removed = self.accounts.remove(position);
                info!("Removed account {}", removed.profile.username);
                Ok(UserEvent::Deleted(removed.profile))
            },
            UserAction::RecordLogin { id, at } => {
                let account = self.account_mut(&id)?;
                account.profile.last_login = Some(at);
                Ok(UserEvent::LoggedIn(account.profile.clone()))
            }
        }
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account, StoreError> {
        self.accounts
            .iter_mut()
            .find(|account| account.profile.id == id)
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct FileFilter {
    /// Case-insensitive match on original name or uploader name
    pub search: Option<String>,
    pub status: Option<ReviewStatus>,
    pub file_type: Option<FileType>,
}

impl FileFilter {
    pub fn matches(&self, file: &UploadedFile) -> bool {
        let matches_search = match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                file.original_name.to_lowercase().contains(&term)
                    || file.uploaded_by_name.to_lowercase().contains(&term)
            },
            None => true
        };
        let matches_status = self.status.map_or(true, |status| file.status == status);
        let matches_type = self.file_type.map_or(true, |file_type| file.file_type == file_type);

        matches_search && matches_status && matches_type
    }
}

pub struct NewNotification {
    pub message: String,
    pub severity: Severity,
}

pub enum FileAction {
    Add(NewFile),
    SetStatus { id: String, status: ReviewStatus },
    Delete { id: String },
    Notify(NewNotification),
    MarkRead { id: String },
}

#[derive(Debug, PartialEq)]
pub enum FileEvent {
    Added(UploadedFile),
    StatusChanged(UploadedFile),
    Deleted(UploadedFile),
    Notified(Notification),
    NotificationRead(Notification),
}

/// Registry of uploaded files and the notifications they raise.
pub struct FileStore {
    files: Vec<UploadedFile>,
    // Newest first
    notifications: Vec<Notification>,
    id_length: usize,
}

impl FileStore {
    pub fn new(id_length: usize) -> Self {
        FileStore { files: Vec::new(), notifications: Vec::new(), id_length }
    }

    /// Inserts a record as is, bypassing the upload side effects.
    pub fn insert(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn insert_notification(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn get(&self, id: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|file| file.id == id)
    }

    pub fn query(&self, filter: &FileFilter) -> Vec<UploadedFile> {
        self.files.iter().filter(|file| filter.matches(file)).cloned().collect()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|notification| !notification.read).count()
    }

    pub fn dispatch(&mut self, action: FileAction) -> Result<FileEvent, StoreError> {
        match action {
            FileAction::Add(new_file) => {
                let file = UploadedFile {
                    id: generate_id(self.id_length),
                    filename: new_file.filename,
                    original_name: new_file.original_name,
                    file_type: new_file.file_type,
                    size: new_file.size,
                    uploaded_by: new_file.uploaded_by,
                    uploaded_by_name: new_file.uploaded_by_name,
                    upload_date: Utc::now(),
                    status: ReviewStatus::Pending,
                    mime_type: new_file.mime_type,
                    notes: new_file.notes,
                };
                self.files.push(file.clone());
                info!("Registered {} file {} from {}", file.file_type, file.filename, file.uploaded_by_name);

                self.dispatch(FileAction::Notify(NewNotification {
                    message: format!("New {} file uploaded by {}", file.file_type, file.uploaded_by_name),
                    severity: Severity::Info,
                }))?;
                Ok(FileEvent::Added(file))
            },
            FileAction::SetStatus { id, status } => {
                let file = self.files
                    .iter_mut()
                    .find(|file| file.id == id)
                    .ok_or(StoreError::FileNotFound(id))?;
                if file.status != ReviewStatus::Pending || status == ReviewStatus::Pending {
                    return Err(StoreError::InvalidTransition { from: file.status.as_str(), to: status.as_str() });
                }
                file.status = status;
                info!("File {} marked {}", file.id, status.as_str());
                Ok(FileEvent::StatusChanged(file.clone()))
            },
            FileAction::Delete { id } => {
                let position = self.files
                    .iter()
                    .position(|file| file.id == id)
                    .ok_or(StoreError::FileNotFound(id))?;
                Ok(FileEvent::Deleted(self.files.remove(position)))
            },
            FileAction::Notify(new_notification) => {
                let notification = Notification {
                    id: generate_id(self.id_length),
                    message: new_notification.message,
                    severity: new_notification.severity,
                    timestamp: Utc::now(),
                    read: false,
                };
                self.notifications.insert(0, notification.clone());
                Ok(FileEvent::Notified(notification))
            },
            FileAction::MarkRead { id } => {
                let notification = self.notifications
                    .iter_mut()
                    .find(|notification| notification.id == id)
                    .ok_or(StoreError::NotificationNotFound(id))?;
                notification.read = true;
                Ok(FileEvent::NotificationRead(notification.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@teamfocuz.com", username),
            role,
            name: username.to_uppercase(),
            password: String::from("password123"),
        }
    }

    fn new_file(name: &str, file_type: FileType) -> NewFile {
        NewFile {
            filename: crate::utils::normalize_filename(name),
            original_name: name.to_string(),
            file_type,
            size: 1024,
            uploaded_by: String::from("2"),
            uploaded_by_name: String::from("Alex Johnson"),
            mime_type: String::from("video/mp4"),
            notes: None,
        }
    }

    fn added(store: &mut FileStore, name: &str) -> UploadedFile {
        match store.dispatch(FileAction::Add(new_file(name, FileType::Video))).unwrap() {
            FileEvent::Added(file) => file,
            other => panic!("unexpected event {:?}", other)
        }
    }

    #[test]
    fn login_with_correct_password_refreshes_last_login() {
        let mut store = UserStore::new(8);
        store.dispatch(UserAction::Add(new_user("veditor", Role::VideoEditor))).unwrap();
        let now = Utc::now();

        let user = store.authenticate("veditor", "password123", now).unwrap();
        assert_eq!(user.last_login, Some(now));
        assert_eq!(store.find_by_username("veditor").unwrap().last_login, Some(now));
    }

    #[test]
    fn login_with_wrong_credentials_fails() {
        let mut store = UserStore::new(8);
        store.dispatch(UserAction::Add(new_user("veditor", Role::VideoEditor))).unwrap();

        assert!(store.authenticate("veditor", "password124", Utc::now()).is_none());
        assert!(store.authenticate("nobody", "password123", Utc::now()).is_none());
        assert_eq!(store.find_by_username("veditor").unwrap().last_login, None);
    }

    #[test]
    fn usernames_stay_unique() {
        let mut store = UserStore::new(8);
        store.dispatch(UserAction::Add(new_user("swriter", Role::ScriptWriter))).unwrap();
        let other = match store.dispatch(UserAction::Add(new_user("vartist", Role::VoiceArtist))).unwrap() {
            UserEvent::Added(user) => user,
            other => panic!("unexpected event {:?}", other)
        };

        assert_eq!(
            store.dispatch(UserAction::Add(new_user("swriter", Role::Admin))),
            Err(StoreError::UsernameTaken(String::from("swriter")))
        );
        let rename = UserChanges { username: Some(String::from("swriter")), ..Default::default() };
        assert!(store.dispatch(UserAction::Update { id: other.id, changes: rename }).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let mut store = UserStore::new(8);
        let user = match store.dispatch(UserAction::Add(new_user("vartist", Role::VoiceArtist))).unwrap() {
            UserEvent::Added(user) => user,
            other => panic!("unexpected event {:?}", other)
        };

        let changes = UserChanges { role: Some(Role::ScriptWriter), password: Some(String::from("hunter2")), ..Default::default() };
        let updated = match store.dispatch(UserAction::Update { id: user.id.clone(), changes }).unwrap() {
            UserEvent::Updated(user) => user,
            other => panic!("unexpected event {:?}", other)
        };
        assert_eq!(updated.role, Role::ScriptWriter);
        assert_eq!(updated.username, user.username);
        assert_eq!(updated.email, user.email);
        assert!(store.authenticate("vartist", "hunter2", Utc::now()).is_some());
    }

    #[test]
    fn deleting_unknown_user_fails() {
        let mut store = UserStore::new(8);
        assert_eq!(
            store.dispatch(UserAction::Delete { id: String::from("missing") }),
            Err(StoreError::UserNotFound(String::from("missing")))
        );
    }

    #[test]
    fn upload_is_pending_and_raises_notification() {
        let mut store = FileStore::new(8);
        let file = added(&mut store, "Project Intro.mp4");

        assert_eq!(file.status, ReviewStatus::Pending);
        assert_eq!(file.filename, "project_intro.mp4");
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.notifications()[0].message, "New video file uploaded by Alex Johnson");
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn status_transition_changes_only_status() {
        let mut store = FileStore::new(8);
        let file = added(&mut store, "cut.mp4");

        let event = store.dispatch(FileAction::SetStatus { id: file.id.clone(), status: ReviewStatus::Approved }).unwrap();
        let reviewed = match event {
            FileEvent::StatusChanged(file) => file,
            other => panic!("unexpected event {:?}", other)
        };

        assert_eq!(reviewed, UploadedFile { status: ReviewStatus::Approved, ..file });
    }

    #[test]
    fn only_pending_files_can_be_reviewed() {
        let mut store = FileStore::new(8);
        let file = added(&mut store, "cut.mp4");

        assert!(store.dispatch(FileAction::SetStatus { id: file.id.clone(), status: ReviewStatus::Pending }).is_err());
        store.dispatch(FileAction::SetStatus { id: file.id.clone(), status: ReviewStatus::Rejected }).unwrap();
        assert_eq!(
            store.dispatch(FileAction::SetStatus { id: file.id.clone(), status: ReviewStatus::Approved }),
            Err(StoreError::InvalidTransition { from: "rejected", to: "approved" })
        );
        assert_eq!(store.get(&file.id).unwrap().status, ReviewStatus::Rejected);
    }

    #[test]
    fn delete_and_mark_read() {
        let mut store = FileStore::new(8);
        let file = added(&mut store, "cut.mp4");
        let notification_id = store.notifications()[0].id.clone();

        store.dispatch(FileAction::MarkRead { id: notification_id }).unwrap();
        assert_eq!(store.unread_count(), 0);

        store.dispatch(FileAction::Delete { id: file.id.clone() }).unwrap();
        assert!(store.get(&file.id).is_none());
        assert!(store.dispatch(FileAction::Delete { id: file.id }).is_err());
    }

    #[test]
    fn filter_by_search_status_and_type() {
        let mut store = FileStore::new(8);
        let intro = added(&mut store, "Intro Cut.mp4");
        added(&mut store, "Outro.mp4");
        store.dispatch(FileAction::SetStatus { id: intro.id.clone(), status: ReviewStatus::Approved }).unwrap();

        let by_name = FileFilter { search: Some(String::from("INTRO")), ..Default::default() };
        assert_eq!(store.query(&by_name).len(), 1);

        let by_uploader = FileFilter { search: Some(String::from("alex")), ..Default::default() };
        assert_eq!(store.query(&by_uploader).len(), 2);

        let pending = FileFilter { status: Some(ReviewStatus::Pending), ..Default::default() };
        assert_eq!(store.query(&pending)[0].original_name, "Outro.mp4");

        let scripts = FileFilter { file_type: Some(FileType::Script), ..Default::default() };
        assert!(store.query(&scripts).is_empty());
    }
}
