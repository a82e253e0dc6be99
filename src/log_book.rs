use std::collections::VecDeque;

use chrono::{DateTime, Duration, Local};

use crate::types::{AttitudeSample, LogEntry};

/// Most recent entries kept for the log table
pub const DEFAULT_LOG_CAPACITY: usize = 51;

/// One entry per this many attitude frames (mean rate of the old random draw)
pub const DEFAULT_LOG_EVERY: u32 = 10;

/// Deterministic log sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogCadence {
    /// Record on the n-th, 2n-th, ... attitude frame
    EveryNth(u32),
    /// Record the first frame, then the first frame at least this long after the last entry
    Interval(Duration),
}

impl Default for LogCadence {
    fn default() -> Self {
        LogCadence::EveryNth(DEFAULT_LOG_EVERY)
    }
}

/// Bounded FIFO log of smoothed attitude snapshots
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    cadence: LogCadence,
    frames_since_entry: u32,
    last_entry_at: Option<DateTime<Local>>,
}

impl LogBook {
    pub fn new(capacity: usize, cadence: LogCadence) -> Self {
        LogBook {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cadence,
            frames_since_entry: 0,
            last_entry_at: None,
        }
    }

    /// Offer one attitude frame. Returns true when it was recorded.
    pub fn observe(&mut self, attitude: &AttitudeSample, now: DateTime<Local>) -> bool {
        if !self.due(now) {
            return false;
        }
        self.push(LogEntry::new(now.format("%H:%M:%S").to_string(), attitude));
        self.last_entry_at = Some(now);
        true
    }

    fn due(&mut self, now: DateTime<Local>) -> bool {
        match self.cadence {
            LogCadence::EveryNth(n) => {
                self.frames_since_entry += 1;
                if self.frames_since_entry >= n.max(1) {
                    self.frames_since_entry = 0;
                    true
                } else {
                    false
                }
            }
            LogCadence::Interval(interval) => match self.last_entry_at {
                None => true,
                Some(last) => now.signed_duration_since(last) >= interval,
            },
        }
    }

    /// Append and evict from the front past capacity
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
