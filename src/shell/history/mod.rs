//! In-memory command history.

use std::collections::VecDeque;

/// Previously submitted lines, oldest first, never more than `capacity`.
#[derive(Debug, Default)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> History {
        History {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity,
        }
    }

    /// Add a line, evicting the oldest entry when full. Empty lines and a
    /// zero-capacity history record nothing.
    pub fn record<S: AsRef<str> + Into<String>>(&mut self, line: S) -> bool {
        if self.capacity == 0 || line.as_ref().trim().is_empty() {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.into());
        true
    }

    /// The last recorded line, if any.
    pub fn most_recent(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, String> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history() {
        let history = History::with_capacity(10);
        assert!(history.is_empty());
        assert_eq!(history.most_recent(), None);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut history = History::with_capacity(3);
        for line in &["one", "two", "three", "four"] {
            assert!(history.record(*line));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.most_recent(), Some("four"));
        let kept: Vec<&String> = history.iter().collect();
        assert_eq!(kept, vec!["two", "three", "four"]);
    }

    #[test]
    fn never_grows_past_capacity() {
        let mut history = History::with_capacity(10);
        for n in 0..25 {
            history.record(format!("echo {}", n));
            assert!(history.len() <= history.capacity());
        }
        assert_eq!(history.most_recent(), Some("echo 24"));
        assert!(history.iter().all(|line| line != "echo 14"));
    }

    #[test]
    fn ignores_blank_lines() {
        let mut history = History::with_capacity(2);
        assert!(!history.record(""));
        assert!(!history.record("   "));
        assert!(history.is_empty());
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut history = History::with_capacity(0);
        assert!(!history.record("ls"));
        assert_eq!(history.most_recent(), None);
    }
}
