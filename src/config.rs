//! Paths and patterns both utilities read from.
//!
//! Defaults describe the usual layout: an `android/` Gradle project next to a
//! `public/` asset folder. A JSON file can override any subset of the fields,
//! and the binaries apply their command-line flags on top of that.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime configuration for the build runner and the color inspector.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Build wrapper executable (e.g. `android/gradlew`)
    pub wrapper_path: PathBuf,

    /// Working directory the wrapper runs in
    pub project_dir: PathBuf,

    /// Image checked by `check-bg-color`
    pub image_path: PathBuf,

    /// Glob patterns searched in order for produced artifacts
    pub output_glob_patterns: Vec<String>,

    /// Task passed to the wrapper as its only argument
    pub build_task: String,
}

impl Default for Config {
    fn default() -> Self {
        let apk_dir = "android/app/build/outputs/apk";
        Self {
            wrapper_path: PathBuf::from("android/gradlew"),
            project_dir: PathBuf::from("android"),
            image_path: PathBuf::from("public/sleep.png"),
            output_glob_patterns: vec![
                format!("{apk_dir}/debug/app-debug.apk"),
                format!("{apk_dir}/*/app-*.apk"),
                format!("{apk_dir}/**/*.apk"),
            ],
            build_task: "app:assembleDebug".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or fall back to the defaults when no
    /// file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Can't read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }
}
