//! Watch scheduler
//!
//! `Idle -> Collecting -> Debounced -> (Resolving -> Dispatching) -> Settled`
//!
//! Notifications update the [`Builder`]'s registry right away and restart
//! the debounce window. Once the window passes, the pending changes are
//! taken and one batch runs to completion before anything else is looked
//! at, so batches never overlap.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::application::build::{BuildReport, Builder};

use super::event::{ChangeKind, WatcherState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Collecting,
    Debounced,
    Settled,
}

/// A finished batch
#[derive(Debug, Clone)]
pub struct Settled {
    /// Notifications coalesced into this batch, one per path
    pub changes: Vec<(PathBuf, ChangeKind)>,
    pub report: BuildReport,
    pub elapsed: Duration,
    /// Every known path, filled only after the first batch
    pub announce: Vec<PathBuf>,
}

pub struct WatchScheduler {
    builder: Builder,
    state: WatcherState,
    phase: Phase,
    settled_once: bool,
}

impl WatchScheduler {
    pub fn new(builder: Builder, debounce: Duration) -> Self {
        Self {
            builder,
            state: WatcherState::new(debounce),
            phase: Phase::Idle,
            settled_once: false,
        }
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_pending(&self) -> bool {
        self.state.has_pending()
    }

    /// Distinct paths waiting for the next batch
    pub fn pending(&self) -> usize {
        self.state.pending()
    }

    /// Apply a notification. Returns false when the path is of no interest.
    pub fn notify(&mut self, path: PathBuf, kind: ChangeKind) -> bool {
        self.notify_at(path, kind, Instant::now())
    }

    pub fn notify_at(&mut self, path: PathBuf, kind: ChangeKind, at: Instant) -> bool {
        let relevant = match kind {
            ChangeKind::Changed => self.builder.file_changed(&path),
            ChangeKind::Removed => self.builder.file_removed(&path),
        };
        if relevant {
            self.state.add_change_at(path, kind, at);
            self.phase = Phase::Collecting;
        }
        relevant
    }

    pub fn is_ready(&mut self) -> bool {
        self.is_ready_at(Instant::now())
    }

    /// Whether the quiet window has passed with changes pending
    pub fn is_ready_at(&mut self, now: Instant) -> bool {
        let ready = self.state.should_sync_at(now);
        if ready {
            self.phase = Phase::Debounced;
        }
        ready
    }

    /// The startup batch: everything the cache says is stale, without
    /// waiting for the quiet window
    pub fn prime(&mut self) -> Settled {
        self.run_pending()
    }

    /// Run one batch for the pending changes
    pub fn run_pending(&mut self) -> Settled {
        let changes = self.state.take_changes();
        self.settle(changes)
    }

    /// Run a batch once the window has passed
    pub fn poll_at(&mut self, now: Instant) -> Option<Settled> {
        self.is_ready_at(now).then(|| self.run_pending())
    }

    fn settle(&mut self, changes: Vec<(PathBuf, ChangeKind)>) -> Settled {
        let started = Instant::now();
        let report = self.builder.run_batch(false);
        self.phase = Phase::Settled;

        let announce = if self.settled_once {
            Vec::new()
        } else {
            self.settled_once = true;
            self.builder.known_paths().into_iter().collect()
        };

        Settled {
            changes,
            report,
            elapsed: started.elapsed(),
            announce,
        }
    }
}
