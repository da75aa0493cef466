//! Typed environment variable readers

use std::str::FromStr;
use thiserror::Error;

/// A variable was set but could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {key}: {value:?}")]
pub struct EnvError {
    /// Variable name
    pub key: String,
    /// Raw value that failed to parse
    pub value: String,
}

/// Non-empty trimmed value of `key`, if set
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `key` if it is set; unset or blank yields `Ok(None)`
pub fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, EnvError> {
    match env_string(key) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| EnvError {
            key: key.to_string(),
            value,
        }),
    }
}

/// Parse `key`, using `default` when it is unset
pub fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, EnvError> {
    Ok(env_parse(key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable name so they can run in parallel.

    #[test]
    fn test_unset_uses_default() {
        assert_eq!(env_or("NASDAQ_UTILS_TEST_UNSET", 42u32), Ok(42));
        assert_eq!(env_string("NASDAQ_UTILS_TEST_UNSET"), None);
    }

    #[test]
    fn test_parse_set_value() {
        // SAFETY: the variable is unique to this test
        unsafe {
            std::env::set_var("NASDAQ_UTILS_TEST_PORT", " 8080 ");
        }
        assert_eq!(env_parse::<u16>("NASDAQ_UTILS_TEST_PORT"), Ok(Some(8080)));
    }

    #[test]
    fn test_parse_invalid_value() {
        // SAFETY: the variable is unique to this test
        unsafe {
            std::env::set_var("NASDAQ_UTILS_TEST_BAD", "abc");
        }
        let err = env_or("NASDAQ_UTILS_TEST_BAD", 1u64).unwrap_err();
        assert_eq!(err.key, "NASDAQ_UTILS_TEST_BAD");
        assert_eq!(err.value, "abc");
    }
}
