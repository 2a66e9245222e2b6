use serde::{Deserialize, Serialize};
use std::{io::BufReader, path::Path, fs::{File, self}};
use log::warn;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    // Session related
    // None keeps sessions in a temporary database
    pub session_store_path: Option<String>,
    pub session_token_length: usize,

    // Account related
    pub account_id_length: usize,
    // Placeholder shared password, hashed per account on creation
    pub account_default_password: String,
    pub account_seed_demo_data: bool,

    // Upload related
    pub upload_delay_ms: u64,
    // In the form of mb's 1 = 1mb (Ignore if value = 0)
    pub upload_max_size_mb: u64,
    // Finished uploads stay pollable this long
    pub upload_job_retention_secs: u64,

    // Report related
    pub report_top_contributors: usize,
    pub report_recent_files: usize
}

impl Default for Config {
    fn default() -> Self {
        Config {
            session_store_path: Some(String::from("sessions")),
            session_token_length: 48,
            account_id_length: 8,
            account_default_password: String::from("password123"),
            account_seed_demo_data: true,
            upload_delay_ms: 2000,
            upload_max_size_mb: 0,
            upload_job_retention_secs: 600,
            report_top_contributors: 5,
            report_recent_files: 5
        }
    }
}

pub fn grab_config() -> Option<Config> {
    grab_config_from(Path::new("./config.json"))
}

/// Reads the config at `config_path`. A missing or malformed file is
/// replaced by the defaults, `None` only when that write fails.
pub fn grab_config_from(config_path: &Path) -> Option<Config> {
    let existing = File::open(config_path).ok().and_then(|file| {
        serde_json::from_reader::<_, Config>(BufReader::new(file))
            .map_err(|err| warn!("Ignoring malformed config ({}), {}", config_path.display(), err))
            .ok()
    });
    if existing.is_some() {
        return existing;
    }

    let config = Config::default();
    let pretty_config = serde_json::to_string_pretty(&config).ok()?;
    fs::write(config_path, pretty_config).ok()?;

    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{ "upload_delay_ms": 10 }"#).unwrap();
        assert_eq!(config.upload_delay_ms, 10);
        assert_eq!(config.report_top_contributors, 5);
        assert_eq!(config.account_default_password, "password123");
    }

    #[test]
    fn writes_defaults_when_absent() {
        let path = std::env::temp_dir().join(format!("teamfocuz-config-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        let config = grab_config_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.session_token_length, 48);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_config_is_replaced() {
        let path = std::env::temp_dir().join(format!("teamfocuz-config-bad-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();

        let config = grab_config_from(&path).unwrap();
        assert_eq!(config.upload_job_retention_secs, 600);
        let written: Config = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.report_recent_files, 5);

        let _ = fs::remove_file(&path);
    }
}
