//! Deterministic fakes shared by the unit tests in this crate

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::*;
use crate::traits::PageSource;

/// Build `len` repositories numbered from `start`
pub fn repos(start: usize, len: usize) -> Vec<Repository> {
    (start..start + len)
        .map(|i| Repository {
            id: format!("R_{}", i),
            name: format!("repo-{}", i),
            owner: format!("owner-{}", i % 7),
            stars: (100_000 - i) as i64,
            url: format!("https://github.com/owner-{}/repo-{}", i % 7, i),
        })
        .collect()
}

/// Page source replaying a fixed script and recording the cursors it was asked for
pub struct ScriptedSource {
    script: RefCell<VecDeque<Result<PageOutcome>>>,
    cursors: RefCell<Vec<Option<String>>>,
}

impl ScriptedSource {
    pub fn new(outcomes: Vec<PageOutcome>) -> Self {
        Self::with_results(outcomes.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<PageOutcome>>) -> Self {
        Self {
            script: RefCell::new(results.into()),
            cursors: RefCell::new(Vec::new()),
        }
    }

    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.borrow().clone()
    }
}

impl PageSource for ScriptedSource {
    fn fetch_page(&self, after: Option<&str>) -> Result<PageOutcome> {
        self.cursors.borrow_mut().push(after.map(str::to_string));
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request with cursor {:?}", after))
    }
}

/// Clock frozen at a fixed instant that records requested sleeps
pub struct RecordingClock {
    now: Cell<i64>,
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: Cell::new(now),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for RecordingClock {
    fn now_epoch_secs(&self) -> i64 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}
