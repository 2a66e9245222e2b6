use rand::{distributions::{Alphanumeric, DistString}, rngs::OsRng};

/// Random alphanumeric identifier used for accounts, files, notifications and jobs.
pub fn generate_id(length: usize) -> String {
    Alphanumeric.sample_string(&mut OsRng, length.max(1))
}

/// Stored filename: whitespace runs become `_`, then lower-cased.
pub fn normalize_filename(original_name: &str) -> String {
    let mut filename = String::with_capacity(original_name.len());
    let mut in_whitespace = false;

    for character in original_name.chars() {
        if character.is_whitespace() {
            if !in_whitespace {
                filename.push('_');
            }
            in_whitespace = true;
        } else {
            filename.extend(character.to_lowercase());
            in_whitespace = false;
        }
    }

    filename
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human readable size, rounded to at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return String::from("0 Bytes");
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(SIZE_UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;

    format!("{} {}", rounded, SIZE_UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2048000), "1.95 MB");
        assert_eq!(format_file_size(157286400), "150 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn test_normalize_filename() {
        assert_eq!(normalize_filename("Episode 1 Script - Final Draft.pdf"), "episode_1_script_-_final_draft.pdf");
        assert_eq!(normalize_filename("Take  2.MP3"), "take_2.mp3");
    }

    #[test]
    fn test_generate_id() {
        let id = generate_id(8);
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_id(32), generate_id(32));
    }
}
