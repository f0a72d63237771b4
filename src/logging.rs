//! Diagnostics go to `~/.local/share/myshell/trace.log`, never to the
//! terminal — stdout is the shell's user interface.

use simplelog::{Config, LevelFilter, WriteLogger};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the file logger. Best-effort: failures are silently ignored
/// and the `log` macros become no-ops.
pub fn init() {
    INIT.call_once(|| {
        let Some(home) = std::env::var_os("HOME") else {
            return;
        };
        let log_dir = std::path::Path::new(&home).join(".local/share/myshell");
        let _ = std::fs::create_dir_all(&log_dir);

        let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("trace.log"))
        else {
            return;
        };

        let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), file);
    });
}
