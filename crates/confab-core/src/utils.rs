//! Small helpers — filename stamping, string truncation.

use chrono::Utc;

/// Timestamped artifact filename, e.g. `20260827_153000.wav`.
///
/// Matches the naming scheme used for saved synthesis output so files sort
/// chronologically in the provider directory.
pub fn timestamped_wav_name() -> String {
    format!("{}.wav", Utc::now().format("%Y%m%d_%H%M%S"))
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate_string("hello world, this is a long string", 15);
        assert_eq!(result, "hello world,...");
        assert!(result.len() <= 15);
    }

    #[test]
    fn test_truncate_unicode() {
        let result = truncate_string("こんにちは世界です", 5);
        assert_eq!(result, "こん...");
    }

    #[test]
    fn test_timestamped_wav_name_shape() {
        let name = timestamped_wav_name();
        // YYYYmmdd_HHMMSS.wav
        assert_eq!(name.len(), "20260827_153000.wav".len());
        assert!(name.ends_with(".wav"));
        assert_eq!(name.chars().nth(8), Some('_'));
    }
}
