//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the loader
//! functions. Nothing in this crate reads environment variables; the binary does that and hands
//! the results to [`CoreConfig::new`].

use crate::constants::{IDENTIFIER, SAMPLES_DIR, SETTINGS_FILENAME, TYX_EXTENSION};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    settings_dir: PathBuf,
    samples_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(settings_dir: PathBuf, samples_dir: PathBuf) -> CoreResult<Self> {
        if settings_dir.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput(
                "settings directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            settings_dir,
            samples_dir,
        })
    }

    pub fn settings_dir(&self) -> &Path {
        &self.settings_dir
    }

    /// Full path of the app-wide settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.settings_dir.join(SETTINGS_FILENAME)
    }

    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }
}

/// Resolve the settings directory.
///
/// Uses `override_dir` when given, otherwise the platform configuration directory joined with
/// the application identifier.
pub fn resolve_settings_dir(override_dir: Option<PathBuf>) -> CoreResult<PathBuf> {
    if let Some(dir) = override_dir {
        if dir.is_file() {
            return Err(CoreError::InvalidInput(format!(
                "TYX_SETTINGS_DIR override {} is a file, not a directory",
                dir.display()
            )));
        }
        return Ok(dir);
    }

    dirs::config_dir()
        .map(|dir| dir.join(IDENTIFIER))
        .ok_or_else(|| {
            CoreError::InvalidInput("could not determine the platform config directory".into())
        })
}

/// Resolve the sample documents directory without reading environment variables.
///
/// If `override_dir` is provided, it must be a directory containing at least one `.tyx` file.
/// Otherwise this searches for `samples/` relative to the current working directory and then
/// walks up from `CARGO_MANIFEST_DIR`.
pub fn resolve_samples_dir(override_dir: Option<PathBuf>) -> CoreResult<PathBuf> {
    fn looks_like_samples_dir(path: &Path) -> bool {
        std::fs::read_dir(path)
            .map(|entries| {
                entries.flatten().any(|entry| {
                    entry.path().extension().and_then(|ext| ext.to_str()) == Some(TYX_EXTENSION)
                })
            })
            .unwrap_or(false)
    }

    if let Some(samples_dir) = override_dir {
        if samples_dir.is_dir() && looks_like_samples_dir(&samples_dir) {
            return Ok(samples_dir);
        }
        return Err(CoreError::InvalidInput(
            "TYX_SAMPLES_DIR override is not a valid samples directory (must contain .tyx files)"
                .into(),
        ));
    }

    let cwd_relative = PathBuf::from(SAMPLES_DIR);
    if cwd_relative.is_dir() && looks_like_samples_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(SAMPLES_DIR);
        if candidate.is_dir() && looks_like_samples_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(CoreError::InvalidInput(
        "could not locate samples/ directory with .tyx files".into(),
    ))
}
