use std::collections::{vec_deque, VecDeque};

use anyhow::{bail, Result};

use super::types::Reading;

/// Live session history kept for trend consumers.
pub const HISTORY_CAPACITY: usize = 50;
/// Points shown by the engagement trend chart.
pub const TREND_WINDOW: usize = 30;

/// Bounded FIFO window of readings, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Reading>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            bail!("history capacity must be greater than zero");
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn append(&mut self, reading: Reading) {
        self.entries.push_back(reading);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Last `n` readings in append order. Yields fewer while the buffer is filling.
    pub fn window(&self, n: usize) -> vec_deque::Iter<'_, Reading> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.range(start..)
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.entries.back()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Reading> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Reading> {
        self.entries.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
            capacity: HISTORY_CAPACITY,
        }
    }
}
