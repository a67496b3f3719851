//! Common utilities

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Root of the framework's local model cache.
///
/// Pretrained base models (and their vocab files) are unpacked under
/// `~/.rocketqa/<model_name>/` by the framework on first load.
pub fn cache_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".rocketqa"))
}
