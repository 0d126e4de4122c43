use std::process::Command;

#[test]
fn prints_version() {
    let exe = env!("CARGO_BIN_EXE_marquee");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run marquee --version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "stdout was: {}",
        stdout.trim()
    );
}

#[test]
fn prints_help() {
    let exe = env!("CARGO_BIN_EXE_marquee");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("run marquee --help");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--version"));
}

#[test]
fn missing_config_file_is_an_error() {
    let exe = env!("CARGO_BIN_EXE_marquee");
    let dir = tempfile::tempdir().expect("tempdir");
    let output = Command::new(exe)
        .current_dir(dir.path())
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .output()
        .expect("run marquee --config");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "stderr was: {}", stderr.trim());
}
