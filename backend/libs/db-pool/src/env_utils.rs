//! Environment variable parsing with fallbacks

use std::str::FromStr;

/// Parse `key`, falling back to `default` when it is missing or malformed
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse `key`, `None` when missing or malformed
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Non-empty string value of `key`
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Boolean flag: `1`, `true`, `yes`, `on` (any case) are true
pub fn parse_env_flag(key: &str, default: bool) -> bool {
    match env_non_empty(key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_env_with_default() {
        std::env::remove_var("DB_POOL_TEST_PORT");
        assert_eq!(parse_env_with_default("DB_POOL_TEST_PORT", 42u16), 42);

        std::env::set_var("DB_POOL_TEST_PORT", " 8080 ");
        assert_eq!(parse_env_with_default("DB_POOL_TEST_PORT", 3000u16), 8080);

        std::env::set_var("DB_POOL_TEST_PORT", "eighty");
        assert_eq!(parse_env_with_default("DB_POOL_TEST_PORT", 3000u16), 3000);
        std::env::remove_var("DB_POOL_TEST_PORT");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_non_empty() {
        std::env::set_var("DB_POOL_TEST_BLANK", "   ");
        assert_eq!(env_non_empty("DB_POOL_TEST_BLANK"), None);

        std::env::set_var("DB_POOL_TEST_BLANK", "value");
        assert_eq!(env_non_empty("DB_POOL_TEST_BLANK"), Some("value".to_string()));
        std::env::remove_var("DB_POOL_TEST_BLANK");
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_env_flag() {
        std::env::remove_var("DB_POOL_TEST_FLAG");
        assert!(parse_env_flag("DB_POOL_TEST_FLAG", true));

        std::env::set_var("DB_POOL_TEST_FLAG", "TRUE");
        assert!(parse_env_flag("DB_POOL_TEST_FLAG", false));

        std::env::set_var("DB_POOL_TEST_FLAG", "0");
        assert!(!parse_env_flag("DB_POOL_TEST_FLAG", true));
        std::env::remove_var("DB_POOL_TEST_FLAG");
    }
}
