//! CLI smoke tests — verify basic binary behavior.

use std::process::Command;

fn cli_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_spvits"));
    cmd.arg("--config").arg("/tmp/nonexistent_spvits_config_12345.toml");
    cmd
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "Expected usage info in --help output");
    assert!(stdout.contains("split"));
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("spvits"),
        "Expected binary name in --version output"
    );
}

#[test]
fn test_split_prints_segments() {
    let output = cli_bin()
        .args(["split", "你好。今天天气不错！再见", "--max-length", "6"])
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["你好。", "今天天气不错！", "再见"]);
}

#[test]
fn test_mock_say_then_clear() {
    let dir = tempfile::tempdir().unwrap();
    let temp = dir.path().join("temp");

    let output = cli_bin()
        .env("SPVITS_TEMP_DIR", &temp)
        .args(["--mock", "say", "你好，世界！"])
        .output()
        .expect("failed to run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let clip = String::from_utf8_lossy(&output.stdout).trim().to_string();
    assert!(clip.ends_with(".wav"));
    assert!(std::path::Path::new(&clip).exists());

    let output = cli_bin()
        .env("SPVITS_TEMP_DIR", &temp)
        .arg("clear")
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("清理后: 0.00MB"));
    assert!(!std::path::Path::new(&clip).exists());
}

#[test]
fn test_clear_exits_nonzero_when_a_clip_survives() {
    let dir = tempfile::tempdir().unwrap();
    let temp = dir.path().join("temp");
    // remove_file can't delete a directory
    std::fs::create_dir_all(temp.join("stuck.wav")).unwrap();
    std::fs::write(temp.join("stuck.wav").join("inner.bin"), b"data").unwrap();

    let output = cli_bin()
        .env("SPVITS_TEMP_DIR", &temp)
        .arg("clear")
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stuck.wav"));
}
