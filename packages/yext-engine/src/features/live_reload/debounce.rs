//! Debounce state machine
//!
//! `Idle → Pending → Executing → Idle`. Pure: the caller supplies the
//! clock, so the transitions are testable without sleeping.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::features::file_watcher::FileChangeEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    /// Waiting for the window to close; every new event pushes `deadline`
    Pending { deadline: Instant },
    /// A rebuild is running; `next` is set once events arrived meanwhile
    Executing { next: Option<Instant> },
}

/// Coalesced events of one rebuild. The last event per path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadBatch {
    events: BTreeMap<PathBuf, FileChangeEvent>,
}

impl ReloadBatch {
    pub fn push(&mut self, event: FileChangeEvent) {
        self.events.insert(event.path().to_path_buf(), event);
    }

    pub fn events(&self) -> impl Iterator<Item = &FileChangeEvent> {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    state: DebounceState,
    pending: ReloadBatch,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: DebounceState::Idle,
            pending: ReloadBatch::default(),
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn push(&mut self, event: FileChangeEvent, now: Instant) {
        self.pending.push(event);
        let deadline = now + self.interval;
        self.state = match self.state {
            DebounceState::Idle | DebounceState::Pending { .. } => DebounceState::Pending { deadline },
            DebounceState::Executing { .. } => DebounceState::Executing {
                next: Some(deadline),
            },
        };
    }

    /// Hand out the pending batch once its window has closed
    pub fn poll(&mut self, now: Instant) -> Option<ReloadBatch> {
        match self.state {
            DebounceState::Pending { deadline } if deadline <= now => {
                self.state = DebounceState::Executing { next: None };
                Some(std::mem::take(&mut self.pending))
            }
            _ => None,
        }
    }

    /// The rebuild handed out by `poll` is done
    pub fn finish(&mut self) {
        self.state = match self.state {
            DebounceState::Executing {
                next: Some(deadline),
            } => DebounceState::Pending { deadline },
            DebounceState::Executing { next: None } => DebounceState::Idle,
            other => other,
        };
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }
}
