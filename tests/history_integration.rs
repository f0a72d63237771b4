use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn scratch(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("myshell-hist-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn run_shell(home: &Path, lines: &[&str]) -> String {
    let mut child = Command::new(env!("CARGO_BIN_EXE_myshell"))
        .current_dir(home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn myshell");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            let _ = writeln!(stdin, "{line}");
        }
        let _ = writeln!(stdin, "exit");
    }

    let output = child.wait_with_output().expect("wait output");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn history_file(home: &Path) -> PathBuf {
    home.join(".myshell_log")
}

#[test]
fn commands_are_persisted_oldest_first() {
    let home = scratch("persist");
    run_shell(&home, &["echo one", "echo two"]);
    let contents = fs::read_to_string(history_file(&home)).expect("history written");
    assert_eq!(contents, "echo one\necho two\n");
}

#[test]
fn adjacent_duplicates_collapse() {
    let home = scratch("dedup");
    run_shell(&home, &["echo same", "echo same", "echo other"]);
    let contents = fs::read_to_string(history_file(&home)).expect("history written");
    assert_eq!(contents, "echo same\necho other\n");
}

#[test]
fn log_commands_are_not_recorded() {
    let home = scratch("logskip");
    run_shell(&home, &["echo kept", "log", "log purge"]);
    // purge wins here; the point is that no entry ever starts with "log".
    let contents = fs::read_to_string(history_file(&home)).unwrap_or_default();
    assert!(!contents.contains("log"), "history was: {contents}");
}

#[test]
fn history_survives_a_restart() {
    let home = scratch("restart");
    run_shell(&home, &["echo persistent"]);
    let stdout = run_shell(&home, &["log"]);
    assert!(stdout.contains("echo persistent"), "stdout was: {stdout}");
}

#[test]
fn purge_empties_ring_and_file() {
    let home = scratch("purge");
    run_shell(&home, &["echo doomed", "log purge"]);
    let contents = fs::read_to_string(history_file(&home)).unwrap_or_default();
    assert_eq!(contents, "");

    let stdout = run_shell(&home, &["log", "echo marker"]);
    assert!(!stdout.contains("doomed"), "stdout was: {stdout}");
    assert!(stdout.contains("marker"), "stdout was: {stdout}");
}

#[test]
fn log_execute_runs_but_is_not_relogged() {
    let home = scratch("execute");
    let stdout = run_shell(&home, &["echo alpha", "log execute 1"]);
    // Once from the original run, once echoed by log execute, once from the
    // re-run itself.
    assert!(stdout.matches("alpha").count() >= 3, "stdout was: {stdout}");
    let contents = fs::read_to_string(history_file(&home)).expect("history written");
    assert_eq!(contents, "echo alpha\n");
}

#[test]
fn log_execute_is_one_indexed_newest_first() {
    let home = scratch("indexing");
    let stdout = run_shell(&home, &["echo first", "echo second", "log execute 2"]);
    // Index 2 must re-run "echo first", the older of the two: its word shows
    // up from the original run, the echoed command, and the re-run.
    assert_eq!(stdout.matches("first").count(), 3, "stdout was: {stdout}");
    assert_eq!(stdout.matches("second").count(), 1, "stdout was: {stdout}");
}

#[test]
fn log_execute_rejects_bad_indices() {
    let home = scratch("badindex");
    let stdout = run_shell(&home, &["echo only", "log execute 99"]);
    assert!(stdout.contains("Invalid log index 99"), "stdout was: {stdout}");
}

#[test]
fn history_is_capped_at_fifteen() {
    let home = scratch("cap");
    let lines: Vec<String> = (0..20).map(|i| format!("echo n{i}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    run_shell(&home, &refs);
    let contents = fs::read_to_string(history_file(&home)).expect("history written");
    assert_eq!(contents.lines().count(), 15);
    assert_eq!(contents.lines().next(), Some("echo n5"));
    assert_eq!(contents.lines().last(), Some("echo n19"));
}
