// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::Value;
use miette::Diagnostic;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Malformed quoting in a command line. Offsets are char indices into the line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum TokenizeError {
    #[error("Unterminated double quote starting at offset {offset}")]
    #[diagnostic(code(argline::tokenize::double_quote), help("Close the quote with `\"`"))]
    UnterminatedDoubleQuote { offset: usize },

    #[error("Unterminated single quote starting at offset {offset}")]
    #[diagnostic(code(argline::tokenize::single_quote), help("Close the quote with `'`"))]
    UnterminatedSingleQuote { offset: usize },

    #[error("Invalid character {ch:?} at offset {offset}")]
    #[diagnostic(code(argline::tokenize::invalid_char))]
    InvalidCharacter { offset: usize, ch: char },
}

/// Problems with a set of descriptors, detected once in [`crate::DescriptorSet::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum DescriptorError {
    #[error("Descriptor at position {index} has an empty name")]
    #[diagnostic(code(argline::descriptor::empty_name))]
    EmptyName { index: usize },

    #[error("Descriptor name '{name}' is declared more than once")]
    #[diagnostic(code(argline::descriptor::duplicate_name))]
    DuplicateName { name: String },

    #[error("Short name '-{short_name}' is declared more than once")]
    #[diagnostic(code(argline::descriptor::duplicate_short_name))]
    DuplicateShortName { short_name: char },

    #[error("Only one variadic descriptor is allowed, found '{first}' and '{second}'")]
    #[diagnostic(code(argline::descriptor::multiple_variadic))]
    MultipleVariadic { first: String, second: String },

    #[error("Descriptor '{name}' has a trigger on unknown descriptor '{target}'")]
    #[diagnostic(code(argline::descriptor::unknown_trigger_target))]
    UnknownTriggerTarget { name: String, target: String },
}

/// A token that no descriptor claimed, plus the value that was paired with it (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedArgument {
    pub token: String,
    pub value: Option<String>,
}

impl Display for UnmatchedArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.value {
            Some(value) => write!(f, "{} {}", self.token, value),
            None => write!(f, "{}", self.token),
        }
    }
}

/// A descriptor's trigger was not satisfied by the resolved value of another descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerViolation {
    /// The descriptor that was supplied.
    pub name: String,
    /// The descriptor its trigger refers to.
    pub other: String,
    pub expected: Value,
    pub negate: bool,
    /// Switch triggers read "cannot be used with switch", the rest read "cannot be
    /// used unless".
    pub other_is_switch: bool,
}

impl Display for TriggerViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let Self {
            name,
            other,
            expected,
            negate,
            other_is_switch,
        } = self;
        if *other_is_switch {
            let other_must_be_off = matches!(
                (expected, negate),
                (Value::Bool(false), false) | (Value::Bool(true), true)
            );
            if other_must_be_off {
                write!(f, "--{name} cannot be used with switch --{other}")
            } else {
                write!(f, "--{name} requires switch --{other}")
            }
        } else if *negate {
            write!(
                f,
                "--{name} cannot be used unless --{other} does not equal {expected}"
            )
        } else {
            write!(f, "--{name} cannot be used unless --{other} equals {expected}")
        }
    }
}

/// Everything that can go wrong turning tokens into [`crate::BoundValues`]. Nothing is
/// committed to the caller when one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Diagnostic)]
pub enum ArgsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("Unrecognized arguments: {}", join_unmatched(.items))]
    #[diagnostic(code(argline::bind::unrecognized))]
    UnrecognizedArguments { items: Vec<UnmatchedArgument> },

    #[error("Value not set for '{name}'")]
    #[diagnostic(code(argline::bind::missing_value))]
    MissingValue { name: String },

    #[error("Invalid value '{value}' for '{name}', expected {expected}")]
    #[diagnostic(code(argline::bind::invalid_value))]
    InvalidValue {
        name: String,
        value: String,
        expected: String,
    },

    #[error("{0}")]
    #[diagnostic(code(argline::bind::trigger_violation))]
    TriggerViolation(TriggerViolation),
}

fn join_unmatched(items: &[UnmatchedArgument]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn violation(expected: Value, negate: bool, other_is_switch: bool) -> String {
        TriggerViolation {
            name: "comment".into(),
            other: "information".into(),
            expected,
            negate,
            other_is_switch,
        }
        .to_string()
    }

    #[test]
    fn test_switch_and_value_triggers_read_differently() {
        assert_eq!(
            violation(Value::Bool(false), false, true),
            "--comment cannot be used with switch --information"
        );
        assert_eq!(
            violation(Value::Bool(true), false, true),
            "--comment requires switch --information"
        );
        assert_eq!(
            violation(Value::from("x"), false, false),
            "--comment cannot be used unless --information equals x"
        );
        assert_eq!(
            violation(Value::from("x"), true, false),
            "--comment cannot be used unless --information does not equal x"
        );
    }

    #[test]
    fn test_unrecognized_lists_every_item() {
        let err = ArgsError::UnrecognizedArguments {
            items: vec![
                UnmatchedArgument {
                    token: "--nope".into(),
                    value: None,
                },
                UnmatchedArgument {
                    token: "extra".into(),
                    value: Some("value".into()),
                },
            ],
        };
        assert_eq!(err.to_string(), "Unrecognized arguments: --nope, extra value");
    }
}
