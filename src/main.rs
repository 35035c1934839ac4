use anyhow::{Context, Result};
use apk_build_tools::{observability, run_build, Config};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(
    name = "run-build",
    about = "Build the debug APK with the project's Gradle wrapper and list the produced files"
)]
struct Args {
    /// JSON config file. Flags below override its values.
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the build wrapper executable.
    #[clap(short, long, value_name = "PATH")]
    wrapper: Option<PathBuf>,

    /// Directory the wrapper runs in.
    #[clap(short = 'd', long, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Task passed to the wrapper.
    #[clap(short, long, value_name = "TASK")]
    task: Option<String>,

    /// Artifact glob pattern, tried in the given order. Replaces the configured list.
    #[clap(short, long = "pattern", value_name = "GLOB")]
    patterns: Vec<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(wrapper) = self.wrapper {
            config.wrapper_path = wrapper;
        }
        if let Some(dir) = self.project_dir {
            config.project_dir = dir;
        }
        if let Some(task) = self.task {
            config.build_task = task;
        }
        if !self.patterns.is_empty() {
            config.output_glob_patterns = self.patterns;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    observability::init_tracing();
    let config = Args::parse().into_config()?;

    let mut stdout = std::io::stdout().lock();
    let code = run_build(&config, &mut stdout).context("Can't report build result")?;
    stdout.flush()?;

    std::process::exit(code)
}
