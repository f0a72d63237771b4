use std::path::PathBuf;

use crate::history::HistoryStore;
use crate::jobs::JobTable;

/// The single process-scope state struct, passed by reference into every
/// component. The only state living outside it is the foreground-pgid
/// atomic in [`crate::signals`], which must stay reachable from handler
/// context.
pub struct ShellState {
    /// Working directory captured at startup; immutable for the process
    /// lifetime. Anchor for `~` and for the history file.
    pub home: PathBuf,
    /// Previous working directory for `hop -` / `reveal -`; unset at start.
    pub prev_dir: Option<PathBuf>,
    pub jobs: JobTable,
    pub history: HistoryStore,
}

impl ShellState {
    pub fn new(home: PathBuf) -> Self {
        let history = HistoryStore::load(&home);
        ShellState {
            home,
            prev_dir: None,
            jobs: JobTable::new(),
            history,
        }
    }
}
