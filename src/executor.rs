use std::fs::File;
use std::io::{self, Write};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;

use os_pipe::{PipeReader, PipeWriter};

use crate::builtins::{self, BuiltinAction, Capability, PipelineContext};
use crate::errors::ShellError;
use crate::job_control::{self, GroupWaitOutcome};
use crate::jobs::JobState;
use crate::lexer;
use crate::parser;
use crate::redirect::{self, StagePlan};
use crate::segment::{self, Terminator};
use crate::signals;
use crate::state::ShellState;

/// What the REPL should do after a line ran.
pub enum ExecutionAction {
    Continue,
    Exit,
}

/// Tokenize, validate, and execute one input line.
///
/// `record` gates the history offer; commands re-entered through
/// `log execute` run with it disabled.
pub fn run_line(line: &str, state: &mut ShellState, record: bool) -> ExecutionAction {
    let tokens = lexer::tokenize(line);
    if let Err(err) = parser::validate(&tokens) {
        log::debug!("rejected {line:?}: {err}");
        println!("{}", ShellError::InvalidSyntax);
        return ExecutionAction::Continue;
    }

    for seg in segment::split_sequence(&tokens) {
        let slice = &tokens[seg.start..seg.end];
        let text = segment::segment_text(slice);
        let stages: Vec<StagePlan> = segment::split_pipeline(slice)
            .into_iter()
            .map(|(s, e)| redirect::plan_stage(&slice[s..e]))
            .collect();

        if seg.terminator == Terminator::Amp {
            // Built-ins are not eligible for background execution.
            if stages.len() == 1 && builtins::is_builtin(stages[0].head()) {
                log::debug!("refusing to background built-in {:?}", stages[0].head());
                continue;
            }
            launch(stages, &text, state, true);
            continue;
        }

        let action = if stages.len() == 1 && builtins::is_builtin(stages[0].head()) {
            run_parent_builtin(&stages[0], state)
        } else {
            launch(stages, &text, state, false);
            ExecutionAction::Continue
        };

        if let ExecutionAction::Exit = action {
            return ExecutionAction::Exit;
        }
        if record {
            state.history.record(&text);
        }
    }

    ExecutionAction::Continue
}

/// A single built-in in the foreground runs in the shell itself. Its output
/// descriptor is resolved from the redirection plan and restored implicitly
/// when the writer drops; input targets are opened for their side effects.
fn run_parent_builtin(plan: &StagePlan, state: &mut ShellState) -> ExecutionAction {
    if let Err(err) = redirect::open_input(&plan.redirections) {
        println!("{err}");
        return ExecutionAction::Continue;
    }
    let output = match redirect::open_output(&plan.redirections) {
        Ok(output) => output,
        Err(err) => {
            println!("{err}");
            return ExecutionAction::Continue;
        }
    };

    let mut out: Box<dyn Write> = match output {
        Some(file) => Box::new(file),
        None => Box::new(io::stdout()),
    };

    let action = builtins::run_in_parent(&plan.argv, out.as_mut(), state);
    let _ = out.flush();

    match action {
        BuiltinAction::Exit => ExecutionAction::Exit,
        BuiltinAction::Continue => ExecutionAction::Continue,
    }
}

enum InputHandle {
    Inherit,
    Null,
    File(File),
    Pipe(PipeReader),
}

enum OutputHandle {
    Inherit,
    File(File),
    Pipe(PipeWriter),
}

impl InputHandle {
    fn into_stdio(self) -> Stdio {
        match self {
            InputHandle::Inherit => Stdio::inherit(),
            InputHandle::Null => Stdio::null(),
            InputHandle::File(file) => Stdio::from(file),
            InputHandle::Pipe(reader) => Stdio::from(reader),
        }
    }
}

impl OutputHandle {
    fn into_stdio(self) -> Stdio {
        match self {
            OutputHandle::Inherit => Stdio::inherit(),
            OutputHandle::File(file) => Stdio::from(file),
            OutputHandle::Pipe(writer) => Stdio::from(writer),
        }
    }

    fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            OutputHandle::Inherit => Box::new(io::stdout()),
            OutputHandle::File(file) => Box::new(file),
            OutputHandle::Pipe(writer) => Box::new(writer),
        }
    }
}

/// Known stdin consumers: a first pipeline stage with no pipe and no
/// explicit `<` gets `/dev/null` instead of the terminal so it sees EOF.
fn consumes_stdin(plan: &StagePlan) -> bool {
    matches!(plan.head(), "wc" | "grep") || (plan.head() == "cat" && plan.argv.len() == 1)
}

/// Launch a segment: one atomic or a pipeline, foreground or background.
///
/// All redirection targets are opened before anything is spawned — a failed
/// open aborts the whole segment. The first external stage leads a fresh
/// process group and later stages join it; child and parent both race the
/// `setpgid` so no signal can land on a half-placed cohort.
fn launch(stages: Vec<StagePlan>, text: &str, state: &mut ShellState, background: bool) {
    let mut resolved: Vec<(Option<File>, Option<File>)> = Vec::with_capacity(stages.len());
    for plan in &stages {
        let input = match redirect::open_input(&plan.redirections) {
            Ok(input) => input,
            Err(err) => {
                println!("{err}");
                return;
            }
        };
        let output = match redirect::open_output(&plan.redirections) {
            Ok(output) => output,
            Err(err) => {
                println!("{err}");
                return;
            }
        };
        resolved.push((input, output));
    }

    let stage_count = stages.len();
    let mut readers: Vec<Option<PipeReader>> = Vec::new();
    let mut writers: Vec<Option<PipeWriter>> = Vec::new();
    for _ in 1..stage_count {
        match os_pipe::pipe() {
            Ok((reader, writer)) => {
                readers.push(Some(reader));
                writers.push(Some(writer));
            }
            Err(err) => {
                eprintln!("myshell: failed to create pipe: {err}");
                return;
            }
        }
    }

    let ctx = Arc::new(PipelineContext::snapshot(state));
    let mut pipeline_pgid: Option<libc::pid_t> = None;
    let mut child_pids: Vec<libc::pid_t> = Vec::new();
    let mut last_external_pid: Option<libc::pid_t> = None;
    let mut builtin_threads: Vec<thread::JoinHandle<()>> = Vec::new();

    for (i, (plan, (input, output))) in stages.iter().zip(resolved).enumerate() {
        let is_last = i + 1 == stage_count;
        let pipe_in = if i > 0 { readers[i - 1].take() } else { None };
        let pipe_out = if !is_last { writers[i].take() } else { None };

        // Explicit file redirections override the pipe connections; the
        // displaced pipe end is dropped so neighbours see EOF/SIGPIPE.
        let stdin = match (input, pipe_in) {
            (Some(file), _) => InputHandle::File(file),
            (None, Some(reader)) => InputHandle::Pipe(reader),
            (None, None) if background => InputHandle::Null,
            (None, None) if stage_count > 1 && consumes_stdin(plan) => InputHandle::Null,
            (None, None) => InputHandle::Inherit,
        };
        let stdout = match (output, pipe_out) {
            (Some(file), _) => OutputHandle::File(file),
            (None, Some(writer)) => OutputHandle::Pipe(writer),
            (None, None) => OutputHandle::Inherit,
        };

        if builtins::capability(plan.head()) == Some(Capability::ChildSafe) {
            // Child-safe built-ins run "in the child" the Rust way: on a
            // thread holding the pipe writer. The unused stdin handle drops
            // here, which is what closes the upstream pipe.
            drop(stdin);
            let mut writer = stdout.into_writer();
            let argv = plan.argv.clone();
            let ctx = Arc::clone(&ctx);
            if is_last && !background {
                builtins::run_in_pipeline(&argv, &ctx, writer.as_mut());
                let _ = writer.flush();
            } else {
                builtin_threads.push(thread::spawn(move || {
                    builtins::run_in_pipeline(&argv, &ctx, writer.as_mut());
                    let _ = writer.flush();
                }));
            }
            continue;
        }

        match spawn_external(&plan.argv, stdin.into_stdio(), stdout.into_stdio(), pipeline_pgid) {
            Ok(child) => {
                let pid = child.id() as libc::pid_t;
                let target = pipeline_pgid.unwrap_or(pid);
                let _ = job_control::set_process_group(pid, target);
                if pipeline_pgid.is_none() {
                    pipeline_pgid = Some(pid);
                }
                child_pids.push(pid);
                last_external_pid = Some(pid);
            }
            // Already-forked stages keep running; the segment survives.
            Err(err) => report_spawn_failure(plan.head(), &err),
        }
    }

    if background {
        // Detached threads close their pipe writers when done, handing EOF
        // downstream; nothing to track for an all-builtin segment.
        drop(builtin_threads);
        let Some(pgid) = pipeline_pgid else { return };
        let repr = last_external_pid.unwrap_or(pgid);
        if state
            .jobs
            .allocate(repr, pgid, child_pids, text.to_string(), JobState::Running)
            .is_none()
        {
            println!("Error: Maximum number of background jobs reached");
        }
        return;
    }

    // Join builtin stages first so every pipe writer is closed by the time
    // the external children are waited on.
    for handle in builtin_threads {
        let _ = handle.join();
    }

    let Some(pgid) = pipeline_pgid else { return };
    let repr = last_external_pid.unwrap_or(pgid);

    signals::set_foreground(pgid);
    let outcome = job_control::wait_for_group(pgid, &child_pids, repr);
    signals::clear_foreground();

    match outcome {
        Ok(GroupWaitOutcome::Exited(code)) => {
            log::debug!("segment {text:?} finished with status {code}");
        }
        Ok(GroupWaitOutcome::Stopped { remaining }) => {
            let repr = remaining.last().copied().unwrap_or(pgid);
            let head = text.split_whitespace().next().unwrap_or_default().to_string();
            if let Some(number) =
                state
                    .jobs
                    .allocate(repr, pgid, remaining, text.to_string(), JobState::Stopped)
            {
                println!("[{number}] Stopped {head}");
            }
        }
        Err(err) => log::warn!("wait on group {pgid} failed: {err}"),
    }
}

/// Spawn an external command. Before `exec`, the child restores default
/// dispositions for INT/TSTP/QUIT/PIPE (SIG_IGN survives exec; the shell's
/// handlers must not leak into children) and places itself into
/// `join_pgid`'s group, or a fresh one of its own when `None`.
fn spawn_external(
    argv: &[String],
    stdin: Stdio,
    stdout: Stdio,
    join_pgid: Option<libc::pid_t>,
) -> io::Result<Child> {
    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]).stdin(stdin).stdout(stdout);

    let target = join_pgid.unwrap_or(0);
    unsafe {
        use std::os::unix::process::CommandExt;
        command.pre_exec(move || {
            for &signal in &[libc::SIGINT, libc::SIGTSTP, libc::SIGQUIT, libc::SIGPIPE] {
                if libc::signal(signal, libc::SIG_DFL) == libc::SIG_ERR {
                    return Err(io::Error::last_os_error());
                }
            }
            if libc::setpgid(0, target) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    command.spawn()
}

fn report_spawn_failure(head: &str, err: &io::Error) {
    if err.kind() == io::ErrorKind::NotFound {
        log::debug!("{head}: not found on PATH");
    } else {
        log::warn!("{head}: spawn failed: {err}");
    }
    println!("{}", ShellError::CommandNotFound);
}
