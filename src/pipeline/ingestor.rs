//! New-data detection over polled reading windows

use crate::types::Reading;

/// Readings from one poll that were not seen before.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshReadings {
    /// Ascending by timestamp
    pub readings: Vec<Reading>,
    /// True for the first poll that returned any data (the initial backlog)
    pub initial: bool,
}

/// Tracks the last-seen timestamp across polls.
///
/// A reading is new iff its timestamp is strictly greater than the last-seen
/// timestamp. After each poll the last-seen timestamp moves to the newest
/// fetched timestamp and is never rewound.
#[derive(Debug, Default)]
pub struct ReadingIngestor {
    last_seen: Option<u64>,
}

impl ReadingIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }

    pub fn accept(&mut self, mut batch: Vec<Reading>) -> FreshReadings {
        batch.sort_by_key(|r| r.timestamp);
        let initial = self.last_seen.is_none() && !batch.is_empty();

        let fresh: Vec<Reading> = match self.last_seen {
            Some(seen) => batch.into_iter().filter(|r| r.timestamp > seen).collect(),
            None => batch,
        };

        if let Some(newest) = fresh.last().map(|r| r.timestamp) {
            self.last_seen = Some(self.last_seen.map_or(newest, |seen| seen.max(newest)));
        }

        FreshReadings {
            readings: fresh,
            initial,
        }
    }
}
