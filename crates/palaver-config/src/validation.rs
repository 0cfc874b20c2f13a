// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: endpoint schemes, non-empty
//! markers and placeholders, recognised log levels, and sane timeouts.

use crate::diagnostic::ConfigError;
use crate::model::PalaverConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &PalaverConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.client.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "client.log_level `{}` is not one of: {}",
                config.client.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.client.error_placeholder.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.error_placeholder must not be empty".to_string(),
        });
    }

    check_scheme(
        &mut errors,
        "http.endpoint",
        &config.http.endpoint,
        &["http://", "https://"],
    );

    if config.http.timeout_secs == Some(0) {
        errors.push(ConfigError::Validation {
            message: "http.timeout_secs must be at least 1 when set".to_string(),
        });
    }

    check_scheme(
        &mut errors,
        "streaming.endpoint",
        &config.streaming.endpoint,
        &["ws://", "wss://"],
    );

    if config.streaming.end_marker.is_empty() {
        errors.push(ConfigError::Validation {
            message: "streaming.end_marker must not be empty".to_string(),
        });
    }

    if config.streaming.connect_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "streaming.connect_timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_scheme(errors: &mut Vec<ConfigError>, key: &str, value: &str, schemes: &[&str]) {
    let value = value.trim();
    let Some(rest) = schemes.iter().find_map(|s| value.strip_prefix(s)) else {
        errors.push(ConfigError::Validation {
            message: format!(
                "{key} `{value}` must start with {}",
                schemes.join(" or ")
            ),
        });
        return;
    };
    if rest.is_empty() || rest.starts_with('/') {
        errors.push(ConfigError::Validation {
            message: format!("{key} `{value}` has no host"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &PalaverConfig) -> Vec<String> {
        match validate_config(config) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&PalaverConfig::default()).is_ok());
    }

    #[test]
    fn http_endpoint_requires_http_scheme() {
        let mut config = PalaverConfig::default();
        config.http.endpoint = "ws://localhost:8502".into();
        let msgs = messages(&config);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("http.endpoint"));
    }

    #[test]
    fn streaming_endpoint_requires_ws_scheme() {
        let mut config = PalaverConfig::default();
        config.streaming.endpoint = "http://localhost:8090".into();
        assert!(messages(&config)[0].contains("streaming.endpoint"));
    }

    #[test]
    fn endpoint_without_host_is_rejected() {
        let mut config = PalaverConfig::default();
        config.http.endpoint = "http:///chat".into();
        assert!(messages(&config)[0].contains("has no host"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = PalaverConfig::default();
        config.client.log_level = "loud".into();
        config.client.error_placeholder = "  ".into();
        config.streaming.end_marker = String::new();
        config.streaming.connect_timeout_secs = 0;
        config.http.timeout_secs = Some(0);
        assert_eq!(messages(&config).len(), 5);
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = PalaverConfig::default();
        config.client.log_level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_turn_timeout_is_allowed() {
        let mut config = PalaverConfig::default();
        config.streaming.turn_timeout_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
