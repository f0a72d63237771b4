use crate::job_control::{self, JobPoll};

/// Fixed capacity of the job table, matching the original shell.
pub const MAX_JOBS: usize = 100;

/// The lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
}

impl JobState {
    fn label(self) -> &'static str {
        match self {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
        }
    }
}

/// A background or stopped job: one process group the shell no longer waits
/// on synchronously.
#[derive(Debug)]
pub struct Job {
    /// Representative pid — the last external stage for pipelines. This is
    /// the pid shown to the user and the one whose exit frees the slot.
    pub pid: libc::pid_t,
    /// Process group for signal delivery (`kill(-pgid, …)`).
    pub pgid: libc::pid_t,
    /// Monotonically increasing over shell lifetime, never reused.
    pub number: u32,
    /// Full reconstructed command text.
    pub command: String,
    /// First whitespace-delimited word, used for sorted display and reports.
    pub head: String,
    /// Every still-tracked stage pid (a singleton for plain commands).
    pub pids: Vec<libc::pid_t>,
    pub state: JobState,
}

/// Fixed-capacity slot table tracking background and stopped jobs.
pub struct JobTable {
    slots: Vec<Option<Job>>,
    next_number: u32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            slots: (0..MAX_JOBS).map(|_| None).collect(),
            next_number: 1,
        }
    }

    /// Claim a free slot for a process group. Returns the job number, or
    /// `None` when all slots are taken. Numbers are never recycled, even
    /// after the slot frees.
    pub fn allocate(
        &mut self,
        pid: libc::pid_t,
        pgid: libc::pid_t,
        pids: Vec<libc::pid_t>,
        command: String,
        state: JobState,
    ) -> Option<u32> {
        let slot = self.slots.iter_mut().find(|s| s.is_none())?;
        let number = self.next_number;
        self.next_number += 1;
        let head = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        log::info!("job [{number}] tracked: pid {pid} pgid {pgid} ({command})");
        *slot = Some(Job {
            pid,
            pgid,
            number,
            command,
            head,
            pids,
            state,
        });
        Some(number)
    }

    pub fn free(&mut self, number: u32) {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|j| j.number == number) {
                log::info!("job [{number}] released");
                *slot = None;
            }
        }
    }

    pub fn find_by_number(&mut self, number: u32) -> Option<&mut Job> {
        self.slots
            .iter_mut()
            .filter_map(|s| s.as_mut())
            .find(|j| j.number == number)
    }

    /// The active job with the greatest number — the `fg`/`bg` default.
    pub fn most_recent(&self) -> Option<u32> {
        self.iter_active().map(|j| j.number).max()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Snapshot for `activities`: `[pid] : <head> - <Running|Stopped>`,
    /// stable lexicographic sort on the command head.
    pub fn activity_lines(&self) -> Vec<String> {
        let mut jobs: Vec<&Job> = self.iter_active().collect();
        jobs.sort_by(|a, b| a.head.cmp(&b.head));
        jobs.iter()
            .map(|j| format!("[{}] : {} - {}", j.pid, j.head, j.state.label()))
            .collect()
    }

    /// Non-blocking sweep over every active slot, accepting both termination
    /// and stop events. Runs before each prompt and before each dispatch.
    ///
    /// Termination of the representative pid prints the one-line report and
    /// frees the slot; a stop flips the state silently; a failed wait frees
    /// the slot defensively.
    pub fn reap(&mut self) {
        for slot in &mut self.slots {
            let Some(job) = slot.as_mut() else { continue };

            let mut done = false;
            let tracked = std::mem::take(&mut job.pids);
            let mut kept = Vec::with_capacity(tracked.len());

            for pid in tracked {
                match job_control::poll_pid(pid) {
                    JobPoll::Running => kept.push(pid),
                    JobPoll::Stopped => {
                        if pid == job.pid {
                            job.state = JobState::Stopped;
                        }
                        kept.push(pid);
                    }
                    JobPoll::Exited { normally } => {
                        if pid == job.pid {
                            let verdict = if normally { "normally" } else { "abnormally" };
                            println!("{} & with pid {} exited {}", job.head, job.pid, verdict);
                            done = true;
                        }
                    }
                    JobPoll::Gone => {
                        if pid == job.pid {
                            done = true;
                        }
                    }
                }
            }

            job.pids = kept;
            if done {
                log::info!("job [{}] reaped", job.number);
                *slot = None;
            }
        }
    }

    /// Logout sweep: SIGKILL every active job's process group.
    pub fn kill_all(&mut self) {
        for job in self.iter_active() {
            if job_control::send_signal_group(job.pgid, libc::SIGKILL).is_err() {
                let _ = job_control::send_signal(job.pid, libc::SIGKILL);
            }
        }
    }
}
