// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::HISTORY_SIZE_MAX;
use std::collections::VecDeque;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Submitted lines, oldest first. Recording a line that is already present moves it to
/// the end, so there are never duplicates.
#[derive(Debug)]
pub struct History {
    pub entries: VecDeque<String>,
    pub max_size: usize,
    /// Entries sent here are recorded by [`crate::Readline`] the next time it polls.
    pub sender: UnboundedSender<String>,
    /// `entries.len()` means past the newest entry, i.e. not navigating.
    index: usize,
    /// The line being edited when navigation started, given back when navigating past
    /// the newest entry.
    draft: Option<String>,
}

impl History {
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel::<String>();
        (
            Self {
                entries: VecDeque::default(),
                max_size: HISTORY_SIZE_MAX,
                sender,
                index: 0,
                draft: None,
            },
            receiver,
        )
    }
}

impl History {
    /// Channel flavor of [`History::record`].
    pub fn update(&mut self, maybe_line: Option<String>) {
        if let Some(line) = maybe_line {
            self.record(line);
        }
    }

    /// Empty lines are ignored. Navigation is reset either way.
    pub fn record(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !line.is_empty() {
            self.entries.retain(|it| *it != line);
            self.entries.push_back(line);
            while self.entries.len() > self.max_size {
                self.entries.pop_front();
            }
        }
        self.reset_navigation();
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.entries.len() > max_size {
            self.entries.pop_front();
        }
        self.reset_navigation();
    }

    pub fn reset_navigation(&mut self) {
        self.index = self.entries.len();
        self.draft = None;
    }

    #[must_use]
    pub fn index(&self) -> usize { self.index }

    #[must_use]
    pub fn is_past_end(&self) -> bool { self.index >= self.entries.len() }

    /// One entry older. `current_line` is kept as the draft when navigation starts.
    /// Returns [`None`] at the oldest entry.
    pub fn previous_entry(&mut self, current_line: &str) -> Option<&str> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        if self.is_past_end() {
            self.index = self.entries.len();
            self.draft = Some(current_line.to_string());
        }
        self.index -= 1;
        self.entries.get(self.index).map(String::as_str)
    }

    /// One entry newer. Moving past the newest entry gives back the draft. Returns
    /// [`None`] when not navigating.
    pub fn next_entry(&mut self) -> Option<String> {
        if self.is_past_end() {
            return None;
        }
        self.index += 1;
        match self.entries.get(self.index) {
            Some(entry) => Some(entry.clone()),
            None => Some(self.draft.take().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_record_same_line_twice() {
        let (mut history, _) = History::new();
        history.record("ls -la");
        history.record("pwd");
        history.record("ls -la");
        assert_eq!(history.entries, vec!["pwd".to_string(), "ls -la".to_string()]);
        assert_eq!(history.index(), history.entries.len());
        assert!(history.is_past_end());
    }

    #[tokio::test]
    async fn test_record_ignores_empty_and_caps_size() {
        let (mut history, _) = History::new();
        history.max_size = 2;
        history.record("");
        assert!(history.entries.is_empty());
        history.update(Some("a".into()));
        history.update(None);
        history.record("b");
        history.record("c");
        assert_eq!(history.entries, vec!["b".to_string(), "c".to_string()]);
        history.set_max_size(1);
        assert_eq!(history.entries, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_navigation_keeps_draft() {
        let (mut history, _) = History::new();
        history.record("one");
        history.record("two");

        assert_eq!(history.previous_entry("dra"), Some("two"));
        assert_eq!(history.previous_entry("two"), Some("one"));
        assert_eq!(history.previous_entry("one"), None);
        assert_eq!(history.next_entry(), Some("two".to_string()));
        assert_eq!(history.next_entry(), Some("dra".to_string()));
        assert_eq!(history.next_entry(), None);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let (mut history, _) = History::new();
        assert_eq!(history.previous_entry("x"), None);
        assert_eq!(history.next_entry(), None);
    }
}
