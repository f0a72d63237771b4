use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

fn scratch(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("myshell-sig-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn spawn_shell(home: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_myshell"))
        .current_dir(home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn myshell")
}

fn send(child: &Child, signal: libc::c_int) {
    // SAFETY: freshly spawned child pid.
    unsafe {
        libc::kill(child.id() as libc::pid_t, signal);
    }
}

fn pause(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}

fn write_line(child: &mut Child, line: &str) {
    let stdin = child.stdin.as_mut().expect("stdin");
    let _ = writeln!(stdin, "{line}");
    let _ = stdin.flush();
}

fn finish(mut child: Child) -> String {
    write_line(&mut child, "exit");
    drop(child.stdin.take());
    let output = child.wait_with_output().expect("wait output");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn sigtstp_at_the_prompt_does_not_stop_the_shell() {
    let home = scratch("tstp-prompt");
    let mut child = spawn_shell(&home);
    pause(300);
    send(&child, libc::SIGTSTP);
    pause(200);
    write_line(&mut child, "echo ALIVE");
    let stdout = finish(child);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
}

#[test]
fn sigint_at_the_prompt_does_not_kill_the_shell() {
    let home = scratch("int-prompt");
    let mut child = spawn_shell(&home);
    pause(300);
    send(&child, libc::SIGINT);
    pause(200);
    write_line(&mut child, "echo ALIVE");
    let stdout = finish(child);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
}

#[test]
fn interrupt_is_relayed_to_the_foreground_group() {
    // Without the relay the shell would sit in waitpid for the full 30
    // seconds and the test harness would time out.
    let home = scratch("int-fg");
    let mut child = spawn_shell(&home);
    write_line(&mut child, "sleep 30");
    pause(400);
    send(&child, libc::SIGINT);
    pause(200);
    write_line(&mut child, "echo DONE");
    let stdout = finish(child);
    assert!(stdout.contains("DONE"), "stdout was: {stdout}");
}

#[test]
fn stop_resume_and_foreground_round_trip() {
    let home = scratch("tstp-fg");
    let mut child = spawn_shell(&home);
    write_line(&mut child, "sleep 3");
    pause(400);
    send(&child, libc::SIGTSTP);
    pause(300);
    write_line(&mut child, "activities");
    write_line(&mut child, "bg 1");
    write_line(&mut child, "activities");
    write_line(&mut child, "fg 1");
    let stdout = finish(child);

    assert!(stdout.contains("[1] Stopped sleep"), "stdout was: {stdout}");
    assert!(stdout.contains(": sleep - Stopped"), "stdout was: {stdout}");
    assert!(stdout.contains("[1] sleep &"), "stdout was: {stdout}");
    assert!(stdout.contains(": sleep - Running"), "stdout was: {stdout}");
    // fg echoes the full stored command line before waiting on it.
    assert!(stdout.contains("sleep 3\n"), "stdout was: {stdout}");
}

#[test]
fn pipeline_sigpipe_does_not_abort_the_shell() {
    // yes writes forever; head exits after one line and closes the pipe.
    // The child gets default SIGPIPE disposition via pre_exec and dies;
    // the shell keeps going.
    let home = scratch("sigpipe");
    let mut child = spawn_shell(&home);
    write_line(&mut child, "yes | head -1");
    write_line(&mut child, "echo ALIVE");
    let stdout = finish(child);
    assert!(stdout.contains("y\n"), "stdout was: {stdout}");
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
}
