//! Running the project's build wrapper.

use crate::artifacts::report_artifacts;
use crate::config::Config;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Exit status reported when the build could not be started at all.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Errors that prevent the wrapper from running.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build wrapper not found: {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("project directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Captured output of one finished wrapper run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `wrapper task` inside `project_dir` and wait for it to finish.
///
/// The task is passed as a discrete argument; no shell is involved. Output is
/// decoded as UTF-8, replacing invalid sequences.
pub fn invoke_wrapper(
    wrapper: &Path,
    project_dir: &Path,
    task: &str,
) -> Result<ProcessResult, BuildError> {
    if !wrapper.exists() {
        return Err(BuildError::MissingExecutable(wrapper.to_path_buf()));
    }
    if !project_dir.is_dir() {
        return Err(BuildError::MissingDirectory(project_dir.to_path_buf()));
    }

    // A relative program path combined with current_dir is resolved
    // differently per platform, so pin it down first.
    let program = wrapper.canonicalize().map_err(|source| BuildError::Spawn {
        program: wrapper.to_path_buf(),
        source,
    })?;

    tracing::info!(
        program = %program.display(),
        dir = %project_dir.display(),
        %task,
        "starting build"
    );

    let output = Command::new(&program)
        .arg(task)
        .current_dir(project_dir)
        .output()
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => BuildError::MissingExecutable(wrapper.to_path_buf()),
            _ => BuildError::Spawn {
                program: program.clone(),
                source,
            },
        })?;

    let exit_code = output.status.code().unwrap_or_else(|| {
        tracing::warn!(status = %output.status, "build terminated without an exit code");
        FAILURE_EXIT_CODE
    });

    Ok(ProcessResult {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
    })
}

/// Build the project and report produced artifacts on success.
///
/// Returns the wrapper's exit code, or [`FAILURE_EXIT_CODE`] when it could
/// not be started.
pub fn run_build<W: Write>(config: &Config, out: &mut W) -> io::Result<i32> {
    run_build_with(config, out, |out| {
        report_artifacts(&config.output_glob_patterns, out).map(|_| ())
    })
}

/// Same as [`run_build`], calling `on_success` once when the wrapper exits 0.
pub fn run_build_with<W, F>(config: &Config, out: &mut W, on_success: F) -> io::Result<i32>
where
    W: Write,
    F: FnOnce(&mut W) -> io::Result<()>,
{
    writeln!(out, "Building debug package...")?;

    let outcome = invoke_wrapper(&config.wrapper_path, &config.project_dir, &config.build_task);
    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "build did not run");
            writeln!(out, "Error: {err}")?;
            if !matches!(err, BuildError::Spawn { .. }) {
                writeln!(
                    out,
                    "Make sure the project directory exists and contains the build wrapper"
                )?;
            }
            return Ok(FAILURE_EXIT_CODE);
        }
    };

    writeln!(out, "STDOUT:")?;
    writeln!(out, "{}", result.stdout)?;
    writeln!(out, "\nSTDERR:")?;
    writeln!(out, "{}", result.stderr)?;
    writeln!(out, "\nExit code: {}", result.exit_code)?;

    if result.success() {
        writeln!(out, "\n✓ Build succeeded")?;
        on_success(out)?;
    } else {
        writeln!(out, "\n✗ Build failed")?;
    }

    Ok(result.exit_code)
}
