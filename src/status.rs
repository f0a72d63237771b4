/// Decode a raw `waitpid` status into shell-style exit-code semantics.
///
/// Signal termination maps to `128 + signal`. Returns `None` for stop and
/// continue events.
pub fn exit_code_from_wait_status(raw_status: libc::c_int) -> Option<i32> {
    if libc::WIFEXITED(raw_status) {
        return Some(libc::WEXITSTATUS(raw_status));
    }

    if libc::WIFSIGNALED(raw_status) {
        let signal = libc::WTERMSIG(raw_status);
        return Some(128 + signal);
    }

    None
}

/// Whether a terminated child counts as a normal exit for background-job
/// reports: exit status zero, nothing else.
pub fn exited_normally(raw_status: libc::c_int) -> bool {
    libc::WIFEXITED(raw_status) && libc::WEXITSTATUS(raw_status) == 0
}
