use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum stored commands, matching the original shell.
pub const HISTORY_CAPACITY: usize = 15;

/// Stable, user-visible file name under the shell home.
pub const HISTORY_FILE: &str = ".myshell_log";

/// Bounded ring of past commands, persisted to `<home>/.myshell_log`
/// oldest-first, one per line, rewritten on every append.
///
/// Invariants: no entry equals its predecessor; no entry begins with the
/// verb `log`; length never exceeds [`HISTORY_CAPACITY`].
pub struct HistoryStore {
    entries: VecDeque<String>,
    path: PathBuf,
}

impl HistoryStore {
    /// Load persisted history from the shell home. A missing or unreadable
    /// file just means an empty history.
    pub fn load(home: &Path) -> Self {
        let path = home.join(HISTORY_FILE);
        let mut entries = VecDeque::new();

        if let Ok(contents) = fs::read_to_string(&path) {
            for line in contents.lines() {
                if entries.len() >= HISTORY_CAPACITY {
                    break;
                }
                if !line.is_empty() {
                    entries.push_back(line.to_string());
                }
            }
        }

        HistoryStore { entries, path }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// 1-indexed lookup, newest first: index 1 is the most recent command.
    pub fn get_newest_first(&self, index: usize) -> Option<&str> {
        if index == 0 || index > self.entries.len() {
            return None;
        }
        self.entries
            .get(self.entries.len() - index)
            .map(String::as_str)
    }

    /// Offer a command for storage. Empty commands, commands whose first
    /// word is `log`, and immediate repeats are dropped; everything else is
    /// appended (evicting the oldest on overflow) and flushed to disk.
    pub fn record(&mut self, command: &str) {
        if !self.should_record(command) {
            return;
        }

        if self.entries.len() >= HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(command.to_string());
        self.save();
    }

    fn should_record(&self, command: &str) -> bool {
        if command.is_empty() {
            return false;
        }
        if command.split_whitespace().next() == Some("log") {
            return false;
        }
        self.entries.back().map(String::as_str) != Some(command)
    }

    /// Drop every entry and truncate the file.
    pub fn purge(&mut self) {
        self.entries.clear();
        self.save();
    }

    /// Rewrite the whole file, oldest first. Failure degrades history to
    /// session-only.
    fn save(&self) {
        let result = fs::File::create(&self.path).and_then(|mut file| {
            for entry in &self.entries {
                writeln!(file, "{entry}")?;
            }
            Ok(())
        });
        if let Err(err) = result {
            log::warn!("history not persisted to {}: {err}", self.path.display());
        }
    }
}
