//! Build-and-inspect helpers for an Android project.
//!
//! Two utilities live on top of this library: `run-build`, which drives the
//! project's Gradle wrapper and reports the produced APKs, and
//! `check-bg-color`, which samples an image to estimate its background color.

pub mod artifacts;
pub mod build;
pub mod config;
pub mod inspect;
pub mod observability;

pub use artifacts::{report_artifacts, ArtifactLocator};
pub use build::{invoke_wrapper, run_build, run_build_with, BuildError, ProcessResult};
pub use config::Config;
pub use inspect::{analyze, inspect, AverageColor, Inspection, PixelSample, Transparency};
