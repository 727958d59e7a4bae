use std::process::Command;

#[test]
fn test_help_lists_commands() {
    let bin = env!("CARGO_BIN_EXE_lathe");
    let output = Command::new(bin).arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["build", "watch", "stages"] {
        assert!(stdout.contains(command), "help missing {command}:\n{stdout}");
    }
}

#[test]
fn test_watch_help_mentions_exec() {
    let bin = env!("CARGO_BIN_EXE_lathe");
    let output = Command::new(bin).args(["watch", "--help"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--exec"));
}
