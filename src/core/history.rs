use crate::domain::model::HistoryEntry;
use std::collections::VecDeque;

pub const HISTORY_LIMIT: usize = 5;

/// Recent checks for the current session, newest first. Never persisted.
#[derive(Debug, Default, Clone)]
pub struct HistoryTracker {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: impl Into<String>, found: bool) {
        self.entries.push_front(HistoryEntry {
            code: code.into(),
            found,
        });
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_prepends() {
        let mut history = HistoryTracker::new();
        history.record("7604", true);
        history.record("7308.90", false);

        let codes: Vec<&str> = history.entries().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["7308.90", "7604"]);
        assert!(!history.entries().next().unwrap().found);
    }

    #[test]
    fn test_history_is_capped_and_evicts_oldest() {
        let mut history = HistoryTracker::new();
        for i in 0..8 {
            history.record(format!("76{:02}", i), i % 2 == 0);
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        let codes: Vec<&str> = history.entries().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["7607", "7606", "7605", "7604", "7603"]);
    }
}
