// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./palaver.toml` > `~/.config/palaver/palaver.toml` > `/etc/palaver/palaver.toml`
//! with environment variable overrides via `PALAVER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PalaverConfig;

/// Config file name looked up in every directory of the hierarchy.
pub const CONFIG_FILE_NAME: &str = "palaver.toml";

/// Sections whose keys may be set through `PALAVER_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &["client", "transport", "http", "streaming"];

/// String-valued keys taken verbatim from the environment. Figment would
/// otherwise parse `[END]` as an array and `42` as an integer.
const RAW_ENV_KEYS: &[&str] = &[
    "client_log_level",
    "client_error_placeholder",
    "transport_kind",
    "http_endpoint",
    "streaming_endpoint",
    "streaming_end_marker",
];

/// System-wide config path.
pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/palaver").join(CONFIG_FILE_NAME)
}

/// Per-user config path under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("palaver").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/palaver/palaver.toml` (system-wide)
/// 3. `~/.config/palaver/palaver.toml` (user XDG config)
/// 4. `./palaver.toml` (local directory)
/// 5. `PALAVER_*` environment variables
pub fn load_config() -> Result<PalaverConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and inline configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PalaverConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
///
/// The XDG hierarchy is skipped entirely when an explicit path is given.
pub fn load_config_from_path(path: &Path) -> Result<PalaverConfig, figment::Error> {
    let figment = Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::file(path));
    merge_env(figment).extract()
}

/// Build the Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    let figment = Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::file(system_config_path()))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME));
    merge_env(figment)
}

/// Merges `PALAVER_*` overrides on top of `figment`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `PALAVER_STREAMING_END_MARKER` maps to `streaming.end_marker`, not
/// `streaming.end.marker`. Keys in [`RAW_ENV_KEYS`] bypass value parsing.
fn merge_env(figment: Figment) -> Figment {
    let parsed = Env::prefixed("PALAVER_")
        .ignore(RAW_ENV_KEYS)
        .map(|key| map_env_key(key.as_str()).into());

    let mut figment = figment.merge(parsed);
    for key in RAW_ENV_KEYS {
        let var = format!("PALAVER_{}", key.to_ascii_uppercase());
        if let Ok(value) = std::env::var(&var) {
            figment = figment.merge(Serialized::default(&map_env_key(key), value));
        }
    }
    figment
}

/// Maps a prefix-stripped env var name to a lowercase dotted config key.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("streaming_end_marker"), "streaming.end_marker");
        assert_eq!(map_env_key("http_timeout_secs"), "http.timeout_secs");
        assert_eq!(map_env_key("client_log_level"), "client.log_level");
        assert_eq!(map_env_key("transport_kind"), "transport.kind");
        assert_eq!(map_env_key("STREAMING_END_MARKER"), "streaming.end_marker");
    }

    #[test]
    fn unknown_env_sections_pass_through() {
        assert_eq!(map_env_key("unrelated_key"), "unrelated_key");
        assert_eq!(map_env_key("httpx_endpoint"), "httpx_endpoint");
    }

    #[test]
    fn user_config_path_ends_with_file_name() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with("palaver/palaver.toml"));
        }
        assert_eq!(system_config_path(), PathBuf::from("/etc/palaver/palaver.toml"));
    }
}
