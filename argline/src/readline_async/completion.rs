// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{DescriptorSet, SHORT_SWITCH_PREFIX, ValueType, quote_if_needed, quote_with};

/// Supplies completion candidates to the line editor.
///
/// `consumed` holds the tokens before the one being typed, `fragment` is the part of the
/// current token typed so far (quotes and escapes already resolved). Return [`None`] for
/// "no opinion", and an empty list for "no matches".
pub trait CompletionSource {
    fn get_completions(&self, consumed: &[String], fragment: &str) -> Option<Vec<String>>;
}

impl<F> CompletionSource for F
where
    F: Fn(&[String], &str) -> Option<Vec<String>>,
{
    fn get_completions(&self, consumed: &[String], fragment: &str) -> Option<Vec<String>> {
        self(consumed, fragment)
    }
}

/// Completes `--name` and `-c` switches, and the values of [`ValueType::Choice`]
/// descriptors right after their switch.
impl CompletionSource for DescriptorSet {
    fn get_completions(&self, consumed: &[String], fragment: &str) -> Option<Vec<String>> {
        if fragment.starts_with(SHORT_SWITCH_PREFIX) {
            let switches = self
                .iter()
                .flat_map(|(_, descriptor)| {
                    std::iter::once(descriptor.long_pattern()).chain(descriptor.short_pattern())
                })
                .filter(|pattern| pattern.starts_with(fragment))
                .collect();
            return Some(switches);
        }

        let previous = consumed.last()?;
        let descriptor = self.get(self.find_switch(previous)?);
        let ValueType::Choice(choices) = descriptor.value_type.element_type() else {
            return None;
        };
        let fragment = fragment.to_lowercase();
        Some(
            choices
                .iter()
                .filter(|choice| choice.to_lowercase().starts_with(&fragment))
                .cloned()
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDirection {
    Next,
    Prev,
}

/// State of a run of completion key presses. Any other edit ends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCycle {
    /// Sorted, no duplicates, never empty.
    candidates: Vec<String>,
    current: Option<usize>,
    /// Char index in the line where the fragment being replaced starts.
    pub fragment_start: usize,
    /// The quote the fragment opened with, reused around every candidate.
    pub quote: Option<char>,
}

impl CompletionCycle {
    /// Returns [`None`] when there is nothing to cycle through.
    #[must_use]
    pub fn new(
        mut candidates: Vec<String>,
        fragment_start: usize,
        quote: Option<char>,
    ) -> Option<Self> {
        candidates.sort();
        candidates.dedup();
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            candidates,
            current: None,
            fragment_start,
            quote,
        })
    }

    #[must_use]
    pub fn candidates(&self) -> &[String] { &self.candidates }

    /// Move to the next or previous candidate, wrapping around both ways, and return the
    /// text to put in the line for it.
    pub fn step(&mut self, direction: CompletionDirection) -> String {
        let len = self.candidates.len();
        let index = match (self.current, direction) {
            (None, CompletionDirection::Next) => 0,
            (None, CompletionDirection::Prev) => len - 1,
            (Some(index), CompletionDirection::Next) => (index + 1) % len,
            (Some(index), CompletionDirection::Prev) => (index + len - 1) % len,
        };
        self.current = Some(index);
        let candidate = &self.candidates[index];
        match self.quote {
            Some(quote) => quote_with(candidate, quote),
            None => quote_if_needed(candidate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DOUBLE_QUOTE, Descriptor};
    use pretty_assertions::assert_eq;

    fn set() -> DescriptorSet {
        DescriptorSet::new(vec![
            Descriptor::required("path"),
            Descriptor::optional("profile")
                .short('p')
                .value_type(ValueType::Choice(vec!["debug".into(), "release".into()])),
            Descriptor::switch("print"),
        ])
        .unwrap()
    }

    #[test]
    fn test_descriptor_set_completes_switches() {
        let mut it = set().get_completions(&[], "--pr").unwrap();
        it.sort();
        assert_eq!(it, vec!["--print".to_string(), "--profile".to_string()]);
        assert_eq!(set().get_completions(&[], "-").unwrap().len(), 4);
    }

    #[test]
    fn test_descriptor_set_completes_choices() {
        assert_eq!(
            set().get_completions(&["-p".to_string()], "RE"),
            Some(vec!["release".to_string()])
        );
        assert_eq!(set().get_completions(&["--print".to_string()], ""), None);
        assert_eq!(set().get_completions(&[], "x"), None);
    }

    #[test]
    fn test_closure_source() {
        let source = |consumed: &[String], fragment: &str| {
            Some(vec![format!("{}{fragment}", consumed.len())])
        };
        assert_eq!(
            source.get_completions(&["a".to_string()], "b"),
            Some(vec!["1b".to_string()])
        );
    }

    #[test]
    fn test_cycle_sorts_and_wraps() {
        let mut cycle =
            CompletionCycle::new(vec!["b".into(), "a".into(), "b".into()], 0, None).unwrap();
        assert_eq!(cycle.candidates(), &["a".to_string(), "b".to_string()]);
        assert_eq!(cycle.step(CompletionDirection::Next), "a");
        assert_eq!(cycle.step(CompletionDirection::Next), "b");
        assert_eq!(cycle.step(CompletionDirection::Next), "a");
        assert_eq!(cycle.step(CompletionDirection::Prev), "b");
    }

    #[test]
    fn test_cycle_prev_starts_at_end() {
        let mut cycle = CompletionCycle::new(vec!["a".into(), "b".into()], 0, None).unwrap();
        assert_eq!(cycle.step(CompletionDirection::Prev), "b");
    }

    #[test]
    fn test_cycle_quoting() {
        let mut quoted =
            CompletionCycle::new(vec!["my file".into()], 3, Some(DOUBLE_QUOTE)).unwrap();
        assert_eq!(quoted.step(CompletionDirection::Next), "\"my file\"");
        let mut bare = CompletionCycle::new(vec!["my file".into()], 3, None).unwrap();
        assert_eq!(bare.step(CompletionDirection::Next), "'my file'");
        assert!(CompletionCycle::new(vec![], 0, None).is_none());
    }
}
