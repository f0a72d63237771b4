use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::ShellError;
use crate::executor::{self, ExecutionAction};
use crate::job_control::{self, GroupWaitOutcome};
use crate::jobs::JobState;
use crate::signals;
use crate::state::ShellState;

/// Where a built-in is allowed to run. Parent-only built-ins mutate shell
/// state (working directory, history, job table) and are meaningless in a
/// child; child-safe ones only produce output and may sit inside a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ParentOnly,
    ChildSafe,
}

pub fn capability(name: &str) -> Option<Capability> {
    match name {
        "exit" | "pwd" | "reveal" | "activities" => Some(Capability::ChildSafe),
        "hop" | "log" | "ping" | "fg" | "bg" => Some(Capability::ParentOnly),
        _ => None,
    }
}

pub fn is_builtin(name: &str) -> bool {
    capability(name).is_some()
}

/// What the REPL should do after a built-in ran.
pub enum BuiltinAction {
    Continue,
    Exit,
}

/// Run a built-in in the shell process. `out` is already resolved from the
/// segment's redirection plan (a file, or stdout).
pub fn run_in_parent(
    argv: &[String],
    out: &mut dyn Write,
    state: &mut ShellState,
) -> BuiltinAction {
    let args = &argv[1..];
    match argv[0].as_str() {
        "exit" => return BuiltinAction::Exit,
        "pwd" => pwd(out),
        "hop" => hop(args, out, state),
        "reveal" => reveal(args, &state.home, state.prev_dir.as_deref(), out),
        "log" => return log_builtin(args, out, state),
        "ping" => ping(args, out),
        "activities" => activities(&state.jobs.activity_lines(), out),
        "fg" => fg(args, out, state),
        "bg" => bg(args, out, state),
        _ => {}
    }
    BuiltinAction::Continue
}

/// Owned snapshot of everything a child-safe built-in may need, so pipeline
/// stages can run on threads without borrowing the shell state.
pub struct PipelineContext {
    pub home: PathBuf,
    pub prev_dir: Option<PathBuf>,
    pub activity_lines: Vec<String>,
}

impl PipelineContext {
    pub fn snapshot(state: &ShellState) -> Self {
        PipelineContext {
            home: state.home.clone(),
            prev_dir: state.prev_dir.clone(),
            activity_lines: state.jobs.activity_lines(),
        }
    }
}

/// Run a child-safe built-in as a pipeline stage, writing into the pipe.
/// `exit` degenerates to an empty stage here, as in a forked child.
pub fn run_in_pipeline(argv: &[String], ctx: &PipelineContext, out: &mut dyn Write) {
    let args = &argv[1..];
    match argv[0].as_str() {
        "exit" => {}
        "pwd" => pwd(out),
        "reveal" => reveal(args, &ctx.home, ctx.prev_dir.as_deref(), out),
        "activities" => activities(&ctx.activity_lines, out),
        _ => {}
    }
}

// ── hop ──

/// `hop [args…]`: change directory. `~` home, `.` no-op, `..` parent, `-`
/// previous directory (silent no-op when unset), anything else a literal
/// path. Arguments are processed left to right.
fn hop(args: &[String], out: &mut dyn Write, state: &mut ShellState) {
    if args.is_empty() {
        let home = state.home.clone();
        change_dir(home, out, state);
        return;
    }

    for arg in args {
        match arg.as_str() {
            "." => continue,
            "~" => {
                let home = state.home.clone();
                change_dir(home, out, state);
            }
            ".." => change_dir(PathBuf::from(".."), out, state),
            "-" => {
                let Some(prev) = state.prev_dir.clone() else {
                    continue;
                };
                change_dir(prev, out, state);
            }
            path => change_dir(PathBuf::from(path), out, state),
        }
    }
}

fn change_dir(target: PathBuf, out: &mut dyn Write, state: &mut ShellState) {
    let before = env::current_dir().ok();
    if env::set_current_dir(&target).is_ok() {
        state.prev_dir = before;
    } else {
        let _ = writeln!(out, "{}", ShellError::NoSuchDirectory);
    }
}

// ── reveal ──

/// `reveal [-a] [-l] [path]`: list a directory. Flags cluster (`-al`);
/// `-` is a path meaning the previous directory, never a flag.
fn reveal(args: &[String], home: &Path, prev_dir: Option<&Path>, out: &mut dyn Write) {
    let mut show_hidden = false;
    let mut one_per_line = false;

    let mut rest = args;
    while let Some(first) = rest.first() {
        if !first.starts_with('-') || first == "-" {
            break;
        }
        for flag in first.chars().skip(1) {
            match flag {
                'a' => show_hidden = true,
                'l' => one_per_line = true,
                _ => {}
            }
        }
        rest = &rest[1..];
    }

    if rest.len() > 1 {
        let _ = writeln!(out, "reveal: Invalid Syntax!");
        return;
    }

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let target = match rest.first().map(String::as_str) {
        None | Some(".") => cwd,
        Some("~") => home.to_path_buf(),
        Some("..") => cwd.parent().map(Path::to_path_buf).unwrap_or(cwd),
        Some("-") => match prev_dir {
            Some(prev) => prev.to_path_buf(),
            None => {
                let _ = writeln!(out, "{}", ShellError::NoSuchDirectory);
                return;
            }
        },
        Some(path) if path.starts_with('/') => PathBuf::from(path),
        Some(path) => cwd.join(path),
    };

    let Ok(dir) = fs::read_dir(&target) else {
        let _ = writeln!(out, "{}", ShellError::NoSuchDirectory);
        return;
    };

    let mut entries: Vec<String> = dir
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| show_hidden || !name.starts_with('.'))
        .collect();
    entries.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });

    if one_per_line {
        for entry in &entries {
            let _ = writeln!(out, "{entry}");
        }
    } else if !entries.is_empty() {
        let _ = writeln!(out, "{}", entries.join(" "));
    }
}

// ── log ──

fn log_builtin(args: &[String], out: &mut dyn Write, state: &mut ShellState) -> BuiltinAction {
    match args {
        [] => {
            for entry in state.history.iter() {
                let _ = writeln!(out, "{entry}");
            }
        }
        [sub] if sub == "purge" => state.history.purge(),
        [sub, index] if sub == "execute" => {
            let index: usize = index.parse().unwrap_or(0);
            let Some(command) = state.history.get_newest_first(index) else {
                let _ = writeln!(
                    out,
                    "Error: Invalid log index {index} (valid range: 1-{})",
                    state.history.len()
                );
                return BuiltinAction::Continue;
            };
            let command = command.to_string();
            let _ = writeln!(out, "{command}");
            let _ = out.flush();
            // Re-entered commands are never recorded, so a stored line can
            // not re-trigger the history machinery.
            if let ExecutionAction::Exit = executor::run_line(&command, state, false) {
                return BuiltinAction::Exit;
            }
        }
        _ => {
            let _ = writeln!(out, "Usage: log [purge | execute <index>]");
        }
    }
    BuiltinAction::Continue
}

// ── ping ──

/// `ping <pid> <signum>`: deliver `signum % 32` to `pid`.
fn ping(args: &[String], out: &mut dyn Write) {
    if args.len() != 2 {
        let _ = writeln!(out, "Invalid syntax!");
        return;
    }
    let (Some(pid), Some(signum)) = (parse_int(&args[0]), parse_int(&args[1])) else {
        let _ = writeln!(out, "Invalid syntax!");
        return;
    };

    let signal = signum % 32;
    match job_control::send_signal(pid as libc::pid_t, signal) {
        Ok(()) => {
            let _ = writeln!(out, "Sent signal {signum} to process with pid {pid}");
        }
        Err(err) => {
            log::debug!("ping: kill({pid}, {signal}) failed: {err}");
            let _ = writeln!(out, "{}", ShellError::NoSuchProcess);
        }
    }
}

/// Strict integer: an optional leading `-` followed by digits only.
fn parse_int(text: &str) -> Option<i32> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

// ── activities ──

fn activities(lines: &[String], out: &mut dyn Write) {
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
}

// ── fg / bg ──

/// Resolve the job a `fg`/`bg` invocation targets: an explicit positive
/// number, or the most recent job when no argument is given.
fn job_target(args: &[String], state: &mut ShellState) -> Option<u32> {
    let number = match args {
        [] => state.jobs.most_recent()?,
        [n] if n.bytes().all(|b| b.is_ascii_digit()) => n.parse::<u32>().ok()?,
        _ => return None,
    };
    state.jobs.find_by_number(number)?;
    Some(number)
}

/// `fg [n]`: bring a job to the foreground and wait for it, re-accepting a
/// stop.
fn fg(args: &[String], out: &mut dyn Write, state: &mut ShellState) {
    let Some(number) = job_target(args, state) else {
        let _ = writeln!(out, "{}", ShellError::NoSuchJob);
        return;
    };

    let Some(job) = state.jobs.find_by_number(number) else {
        return;
    };
    let (pgid, pids, repr, command, head, stopped) = (
        job.pgid,
        job.pids.clone(),
        job.pid,
        job.command.clone(),
        job.head.clone(),
        job.state == JobState::Stopped,
    );

    let _ = writeln!(out, "{command}");
    let _ = out.flush();

    if stopped {
        if let Err(err) = job_control::continue_group(pgid) {
            log::warn!("fg: cannot resume group {pgid}: {err}");
            return;
        }
    }

    signals::set_foreground(pgid);
    let outcome = job_control::wait_for_group(pgid, &pids, repr);
    signals::clear_foreground();

    match outcome {
        Ok(GroupWaitOutcome::Exited(code)) => {
            log::debug!("fg job [{number}] finished with status {code}");
            state.jobs.free(number);
        }
        Ok(GroupWaitOutcome::Stopped { remaining }) => {
            if let Some(job) = state.jobs.find_by_number(number) {
                job.state = JobState::Stopped;
                job.pids = remaining;
            }
            let _ = writeln!(out, "[{number}] Stopped {head}");
        }
        Err(err) => {
            log::warn!("fg: wait on group {pgid} failed: {err}");
            state.jobs.free(number);
        }
    }
}

/// `bg [n]`: resume a stopped job in the background.
fn bg(args: &[String], out: &mut dyn Write, state: &mut ShellState) {
    let Some(number) = job_target(args, state) else {
        let _ = writeln!(out, "{}", ShellError::NoSuchJob);
        return;
    };

    let Some(job) = state.jobs.find_by_number(number) else {
        return;
    };
    if job.state == JobState::Running {
        let _ = writeln!(out, "{}", ShellError::JobAlreadyRunning);
        return;
    }

    if let Err(err) = job_control::continue_group(job.pgid) {
        log::warn!("bg: cannot resume group {}: {err}", job.pgid);
        return;
    }
    job.state = JobState::Running;
    let _ = writeln!(out, "[{}] {} &", number, job.head);
}

// ── pwd ──

fn pwd(out: &mut dyn Write) {
    match env::current_dir() {
        Ok(path) => {
            let _ = writeln!(out, "{}", path.display());
        }
        Err(err) => {
            let _ = writeln!(out, "pwd: {err}");
        }
    }
}
