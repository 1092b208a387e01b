use log::{error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Where a run currently stands. Runs only move forward; `Failed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RunState {
    Start,
    Fetched,
    Rendered,
    Published,
    Done,
    Failed(String),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed(_))
    }
}

/// Handle for one run, returned by [`RunJournal::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RunId(u64);

/// Counts and per-run progress, shared by every run of one process.
///
/// Runs may overlap; each one only moves its own entry.
pub struct RunJournal {
    inner: Mutex<Journal>,
}

struct Journal {
    runs: u64,
    failures: u64,
    in_flight: BTreeMap<RunId, RunState>,
    last_finished: RunState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunProgress {
    pub run: RunId,
    pub state: RunState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalSnapshot {
    pub runs: u64,
    pub failures: u64,
    /// Outcome of the most recently finished run, `Start` before any finished.
    pub state: RunState,
    pub in_flight: Vec<RunProgress>,
}

impl RunJournal {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Journal {
                runs: 0,
                failures: 0,
                in_flight: BTreeMap::new(),
                last_finished: RunState::Start,
            }),
        }
    }

    pub fn begin(&self) -> RunId {
        let mut journal = self.lock();
        journal.runs += 1;
        let run = RunId(journal.runs);
        journal.in_flight.insert(run, RunState::Start);
        info!("run {} started", run.0);
        run
    }

    /// Moves `run` forward; ignored once the run has finished.
    pub fn advance(&self, run: RunId, state: RunState) {
        let mut journal = self.lock();
        let Some(current) = journal.in_flight.get_mut(&run) else {
            return;
        };
        info!("run {} -> {:?}", run.0, state);
        if state.is_terminal() {
            journal.in_flight.remove(&run);
            journal.last_finished = state;
        } else {
            *current = state;
        }
    }

    pub fn fail(&self, run: RunId, reason: impl Into<String>) {
        let mut journal = self.lock();
        if journal.in_flight.remove(&run).is_none() {
            return;
        }
        let reason = reason.into();
        error!("run {} failed: {}", run.0, reason);
        journal.failures += 1;
        journal.last_finished = RunState::Failed(reason);
    }

    pub fn snapshot(&self) -> JournalSnapshot {
        let journal = self.lock();
        JournalSnapshot {
            runs: journal.runs,
            failures: journal.failures,
            state: journal.last_finished.clone(),
            in_flight: journal
                .in_flight
                .iter()
                .map(|(run, state)| RunProgress {
                    run: *run,
                    state: state.clone(),
                })
                .collect(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Journal> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RunJournal {
    fn default() -> Self {
        Self::new()
    }
}
