//! Thin wrappers over the process-group and wait syscalls. Every wrapper
//! retries on `EINTR` so callers never see spurious interruptions.

use std::io;

use crate::status;

/// Outcome of a blocking wait on a foreground process group.
pub enum GroupWaitOutcome {
    /// Every tracked pid terminated; carries the last stage's exit code.
    Exited(i32),
    /// A member stopped; `remaining` holds the pids not yet terminated.
    Stopped { remaining: Vec<libc::pid_t> },
}

/// One non-blocking poll of a tracked pid.
pub enum JobPoll {
    Running,
    Stopped,
    Exited { normally: bool },
    /// The wait call failed (already reaped or never ours); the caller frees
    /// the slot defensively.
    Gone,
}

/// Place `pid` into process group `pgid`. Both the parent and the child race
/// this call; `EACCES`/`ESRCH` mean the other side already won or the child
/// exec'd, and are not errors.
pub fn set_process_group(pid: libc::pid_t, pgid: libc::pid_t) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::setpgid(pid, pgid) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(code) if code == libc::EINTR => continue,
            Some(code) if code == libc::EACCES || code == libc::ESRCH => return Ok(()),
            _ => return Err(err),
        }
    }
}

/// Deliver `signal` to a single process.
pub fn send_signal(pid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    let rc = unsafe { libc::kill(pid, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Deliver `signal` to an entire process group (negative-pid convention).
pub fn send_signal_group(pgid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process group id",
        ));
    }

    loop {
        let rc = unsafe { libc::kill(-pgid, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Resume a stopped process group.
pub fn continue_group(pgid: libc::pid_t) -> io::Result<()> {
    send_signal_group(pgid, libc::SIGCONT)
}

/// Block until every pid in `pids` terminates, or any group member stops.
/// `WUNTRACED` makes a Ctrl-Z stop return here instead of blocking forever.
///
/// Waits on `-pgid` so late arrivals in the group are collected too. The
/// reported exit code is `last_pid`'s; every other stage's status is logged
/// and dropped.
pub fn wait_for_group(
    pgid: libc::pid_t,
    pids: &[libc::pid_t],
    last_pid: libc::pid_t,
) -> io::Result<GroupWaitOutcome> {
    if pids.is_empty() {
        return Ok(GroupWaitOutcome::Exited(0));
    }

    let mut remaining: Vec<libc::pid_t> = pids.to_vec();
    let mut last_exit_code = 0;

    while !remaining.is_empty() {
        let mut raw_status: libc::c_int = 0;
        let waited = unsafe { libc::waitpid(-pgid, &mut raw_status, libc::WUNTRACED) };

        if waited < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(err);
        }

        if libc::WIFSTOPPED(raw_status) {
            return Ok(GroupWaitOutcome::Stopped { remaining });
        }

        let Some(code) = status::exit_code_from_wait_status(raw_status) else {
            continue;
        };

        remaining.retain(|&p| p != waited);
        if waited == last_pid {
            last_exit_code = code;
        } else {
            log::debug!("pipeline stage pid {waited} exited with status {code}");
        }
    }

    Ok(GroupWaitOutcome::Exited(last_exit_code))
}

/// One non-blocking poll of a tracked pid, accepting stop events.
pub fn poll_pid(pid: libc::pid_t) -> JobPoll {
    let mut raw_status: libc::c_int = 0;
    let rc = unsafe {
        libc::waitpid(pid, &mut raw_status, libc::WNOHANG | libc::WUNTRACED)
    };

    if rc == 0 {
        return JobPoll::Running;
    }
    if rc < 0 {
        return JobPoll::Gone;
    }

    if libc::WIFSTOPPED(raw_status) {
        JobPoll::Stopped
    } else if libc::WIFEXITED(raw_status) || libc::WIFSIGNALED(raw_status) {
        JobPoll::Exited {
            normally: status::exited_normally(raw_status),
        }
    } else {
        JobPoll::Running
    }
}
