//! Centralized application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/clarity/` | `~/.config/clarity/` |
//! | Cache | `~/Library/Caches/clarity/` | `~/.cache/clarity/` |
//!
//! # Environment Overrides
//!
//! - `CLARITY_CONFIG_DIR`: overrides [`config_dir`]
//! - `CLARITY_CACHE_DIR`: overrides [`cache_dir`]

use std::path::PathBuf;

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/clarity/` by default. Override with
/// the `CLARITY_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("CLARITY_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("clarity"))
        .unwrap_or_else(|| PathBuf::from("/tmp/clarity-config"))
}

/// Application cache directory, used for downloaded model files.
///
/// Resolves to `dirs::cache_dir()/clarity/` by default. Override with
/// the `CLARITY_CACHE_DIR` environment variable.
#[must_use]
pub fn cache_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("CLARITY_CACHE_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::cache_dir()
        .map(|d| d.join("clarity"))
        .unwrap_or_else(|| PathBuf::from("/tmp/clarity-cache"))
}

/// HuggingFace Hub cache directory (`cache_dir()/huggingface/`).
#[must_use]
pub fn hf_cache_dir() -> PathBuf {
    cache_dir().join("huggingface")
}

/// Default config file: `config_dir()/config.toml`.
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
