//! Interrupt and stop handling.
//!
//! The only state a handler may touch is a word-sized atomic holding the
//! foreground process group id. The handler relays the signal to that group
//! (negative-pid convention) or, with no foreground child, echoes a newline
//! so the prompt line is not left dangling. Everything heavier — moving a
//! stopped child into the job table, printing the `Stopped` report — happens
//! in the main loop when `waitpid(WUNTRACED)` observes the stop.

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};

use signal_hook::consts::{SIGINT, SIGTSTP};

/// Process group of the current foreground child; 0 when the prompt owns the
/// terminal. Mutated only by the executor, read from handler context.
static FOREGROUND_PGID: AtomicI32 = AtomicI32::new(0);

/// Install the SIGINT and SIGTSTP relays. Children never inherit these: the
/// executor resets dispositions to default before `exec`.
pub fn install() -> io::Result<()> {
    // SAFETY: the handlers only call async-signal-safe functions
    // (AtomicI32::load, kill, write).
    unsafe {
        signal_hook::low_level::register(SIGINT, || relay(SIGINT))?;
        signal_hook::low_level::register(SIGTSTP, || relay(SIGTSTP))?;
    }
    Ok(())
}

/// Record the foreground child's process group before waiting on it.
pub fn set_foreground(pgid: libc::pid_t) {
    FOREGROUND_PGID.store(pgid, Ordering::SeqCst);
}

/// Clear the marker once the wait returns; invariant: empty after every
/// REPL iteration.
pub fn clear_foreground() {
    FOREGROUND_PGID.store(0, Ordering::SeqCst);
}

fn relay(signal: libc::c_int) {
    let pgid = FOREGROUND_PGID.load(Ordering::SeqCst);
    if pgid > 0 {
        // SAFETY: kill(2) is async-signal-safe; a stale pgid at worst hits a
        // group the shell no longer tracks, never the shell's own group.
        unsafe {
            libc::kill(-pgid, signal);
        }
    } else {
        let newline = b"\n";
        // SAFETY: write(2) is async-signal-safe.
        unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                newline.as_ptr() as *const libc::c_void,
                newline.len(),
            );
        }
    }
}
