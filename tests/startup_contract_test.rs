use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn launcher(data_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vacation-notifier"));
    cmd.env_clear()
        .env("DATA_DIR", data_dir)
        .env("ENTRYPOINT_TARGET", "check")
        .env("RUST_LOG", "info");
    cmd
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_missing_data_dir_exits_with_environment_unready() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("data");

    let output = launcher(&missing)
        .env("VKT_BOT_TOKEN", "secret")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let lines = stdout_lines(&output);
    let first = lines.first().expect("a diagnostic line on stdout");
    assert!(first.contains(&missing.display().to_string()), "{}", first);
    assert!(first.contains("environment not ready"), "{}", first);
    assert!(!missing.exists());
}

#[test]
fn test_missing_data_dir_is_reported_before_missing_token() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("data");

    let output = launcher(&missing).output().unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(!missing.exists());
}

#[test]
fn test_check_target_succeeds_and_leaves_directory_untouched() {
    let data_dir = TempDir::new().unwrap();
    fs::write(data_dir.path().join("vacation_data.json"), "{}").unwrap();
    let before = listing(data_dir.path());

    for _ in 0..3 {
        let output = launcher(data_dir.path())
            .env("VKT_BOT_TOKEN", "secret")
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));
    }

    assert_eq!(listing(data_dir.path()), before);
    assert_eq!(
        fs::read_to_string(data_dir.path().join("vacation_data.json")).unwrap(),
        "{}"
    );
}

#[test]
fn test_missing_token_exits_misconfigured() {
    let data_dir = TempDir::new().unwrap();

    let output = launcher(data_dir.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("VKT_BOT_TOKEN"), "{}", stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("misconfigured environment"), "{}", stderr);
}

#[test]
fn test_unknown_capability_exits_misconfigured() {
    let data_dir = TempDir::new().unwrap();

    let output = launcher(data_dir.path())
        .env("VKT_BOT_TOKEN", "secret")
        .env("REQUIRED_CAPABILITIES", "tls,fax")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_poll_time_exits_misconfigured() {
    let data_dir = TempDir::new().unwrap();

    let output = launcher(data_dir.path())
        .env("VKT_BOT_TOKEN", "secret")
        .env("POLL_TIME", "0")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_data_dir_that_is_a_file_is_not_ready() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("data");
    fs::write(&file, "").unwrap();

    let output = launcher(&file)
        .env("VKT_BOT_TOKEN", "secret")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(file.is_file());
}

#[cfg(not(feature = "xlsx"))]
#[test]
fn test_missing_capability_exits_before_running() {
    let data_dir = TempDir::new().unwrap();

    let output = launcher(data_dir.path())
        .env("VKT_BOT_TOKEN", "secret")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    let lines = stdout_lines(&output);
    let first = lines.first().expect("a diagnostic line on stdout");
    assert!(first.contains("missing dependency"), "{}", first);
    assert!(first.contains("xlsx"), "{}", first);
    assert!(!lines.iter().any(|l| l.contains("Starting")));
}

#[cfg(feature = "xlsx")]
#[test]
fn test_full_capability_manifest_is_satisfied() {
    let data_dir = TempDir::new().unwrap();

    let output = launcher(data_dir.path())
        .env("VKT_BOT_TOKEN", "secret")
        .env("REQUIRED_CAPABILITIES", "tls,csv,xlsx")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Starting"), "{}", stdout);
}
