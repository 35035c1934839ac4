use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// A missing wrapper exits with status 1 and names the missing path.
#[test]
fn test_missing_wrapper_exits_one() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let wrapper = temp_dir.path().join("gradlew");

    let output = Command::new(binary_path())
        .arg("--wrapper")
        .arg(&wrapper)
        .arg("--project-dir")
        .arg(temp_dir.path())
        .output()
        .expect("Failed to run run-build");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(&wrapper.display().to_string()),
        "missing path not reported in:\n{stdout}"
    );
}

/// The wrapper's exit code becomes the tool's exit code, and a successful
/// build lists the APK the wrapper produced.
#[cfg(unix)]
#[test]
fn test_exit_code_passthrough_and_artifacts() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project = temp_dir.path().join("android");
    std::fs::create_dir(&project).expect("Failed to create project dir");

    let wrapper = project.join("gradlew");
    std::fs::write(
        &wrapper,
        "#!/bin/sh\n[ \"$1\" = fail ] && exit 7\nmkdir -p app/build/outputs/apk/debug\ntouch app/build/outputs/apk/debug/app-debug.apk\n",
    )
    .expect("Failed to write wrapper");
    std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to mark wrapper executable");

    let pattern = format!("{}/app/build/outputs/apk/*/app-*.apk", project.display());
    let run = |task: &str| {
        Command::new(binary_path())
            .arg("--wrapper")
            .arg(&wrapper)
            .arg("--project-dir")
            .arg(&project)
            .arg("--task")
            .arg(task)
            .arg("--pattern")
            .arg(&pattern)
            .output()
            .expect("Failed to run run-build")
    };

    let failed = run("fail");
    assert_eq!(failed.status.code(), Some(7));
    assert!(!String::from_utf8_lossy(&failed.stdout).contains("Found artifacts"));

    let built = run("app:assembleDebug");
    assert_eq!(built.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&built.stdout);
    assert!(stdout.contains("Found artifacts:"));
    assert!(stdout.contains("app-debug.apk"));
}

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_run-build"))
}
