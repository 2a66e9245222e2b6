use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    VideoEditor,
    ScriptWriter,
    VoiceArtist,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::VideoEditor, Role::ScriptWriter, Role::VoiceArtist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::VideoEditor => "video_editor",
            Role::ScriptWriter => "script_writer",
            Role::VoiceArtist => "voice_artist",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::VideoEditor => "Video Editor",
            Role::ScriptWriter => "Script Writer",
            Role::VoiceArtist => "Voice Artist",
        }
    }

    /// Unknown names yield `None` rather than an error.
    pub fn parse(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("Unknown role: {}", s))
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Video,
    Script,
    Voice,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Video => "video",
            FileType::Script => "script",
            FileType::Voice => "voice",
        }
    }

    pub fn parse(name: &str) -> Option<FileType> {
        [FileType::Video, FileType::Script, FileType::Voice]
            .into_iter()
            .find(|file_type| file_type.as_str() == name)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse(name: &str) -> Option<ReviewStatus> {
        [ReviewStatus::Pending, ReviewStatus::Approved, ReviewStatus::Rejected]
            .into_iter()
            .find(|status| status.as_str() == name)
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Public account profile. This is also what the session slot stores.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Display name
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct UploadedFile {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub file_type: FileType,
    pub size: u64,
    pub uploaded_by: String,
    pub uploaded_by_name: String,
    pub upload_date: DateTime<Utc>,
    pub status: ReviewStatus,
    pub mime_type: String,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

/// File record before the registry assigns an id and upload date.
#[derive(Clone, Debug, PartialEq)]
pub struct NewFile {
    pub filename: String,
    pub original_name: String,
    pub file_type: FileType,
    pub size: u64,
    pub uploaded_by: String,
    pub uploaded_by_name: String,
    pub mime_type: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip_through_serde() {
        for role in Role::ALL {
            let encoded = serde_json::to_string(&role).unwrap();
            assert_eq!(encoded, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn unknown_role_does_not_parse() {
        assert_eq!(Role::parse("editor"), None);
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!("voice_artist".parse::<Role>(), Ok(Role::VoiceArtist));
    }
}
