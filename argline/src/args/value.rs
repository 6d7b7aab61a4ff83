// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Separator used when a single token supplies a whole list, e.g. `--tags a,b,c`.
pub const LIST_SEPARATOR: char = ',';

/// A resolved argument value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(it) => Some(*it),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(it) => Some(*it),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(it) => Some(*it),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(it) => Some(*it as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(it) => Some(it),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(it) => Some(it),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(it) => write!(f, "{it}"),
            Value::Int(it) => write!(f, "{it}"),
            Value::Float(it) => write!(f, "{it}"),
            Value::Str(it) => write!(f, "{it}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(it: &str) -> Self { Value::Str(it.to_string()) }
}

impl From<String> for Value {
    fn from(it: String) -> Self { Value::Str(it) }
}

impl From<bool> for Value {
    fn from(it: bool) -> Self { Value::Bool(it) }
}

impl From<i64> for Value {
    fn from(it: i64) -> Self { Value::Int(it) }
}

impl From<f64> for Value {
    fn from(it: f64) -> Self { Value::Float(it) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self { Value::List(items.into_iter().map(Into::into).collect()) }
}

/// The type raw tokens are converted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    /// One of a fixed set of spellings, matched case-insensitively.
    Choice(Vec<String>),
    List(Box<ValueType>),
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValueType::Bool => write!(f, "a boolean"),
            ValueType::Int => write!(f, "an integer"),
            ValueType::Float => write!(f, "a number"),
            ValueType::Str => write!(f, "a string"),
            ValueType::Choice(choices) => write!(f, "one of {}", choices.join("|")),
            ValueType::List(inner) => write!(f, "a list of {inner}"),
        }
    }
}

impl ValueType {
    /// `list(Str)`, the default type of a variadic descriptor.
    #[must_use]
    pub fn list_of_str() -> Self { ValueType::List(Box::new(ValueType::Str)) }

    /// What an unset descriptor with no default and no init value resolves to.
    #[must_use]
    pub fn zero_value(&self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Str | ValueType::Choice(_) | ValueType::List(_) => Value::Null,
        }
    }

    /// Element type used for each token collected by a variadic descriptor.
    #[must_use]
    pub fn element_type(&self) -> &ValueType {
        match self {
            ValueType::List(inner) => inner,
            it => it,
        }
    }

    /// Convert one raw token.
    ///
    /// # Errors
    ///
    /// Returns the part of `raw` that could not be converted.
    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        match self {
            ValueType::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(|| raw.to_string()),
            ValueType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| raw.to_string()),
            ValueType::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| raw.to_string()),
            ValueType::Str => Ok(Value::Str(raw.to_string())),
            ValueType::Choice(choices) => choices
                .iter()
                .find(|choice| choice.eq_ignore_ascii_case(raw.trim()))
                .map(|choice| Value::Str(choice.clone()))
                .ok_or_else(|| raw.to_string()),
            ValueType::List(inner) => raw
                .split(LIST_SEPARATOR)
                .map(|part| inner.convert(part))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }

    /// Convert tokens collected one by one (variadic values, repeated options). Each
    /// token is one element.
    ///
    /// # Errors
    ///
    /// Returns the first token that could not be converted.
    pub fn convert_many(&self, raws: &[String]) -> Result<Value, String> {
        let element_type = self.element_type();
        raws.iter()
            .map(|raw| element_type.convert(raw))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(ValueType::Bool, "YES", Value::Bool(true) ; "bool yes")]
    #[test_case(ValueType::Bool, "off", Value::Bool(false) ; "bool off")]
    #[test_case(ValueType::Int, "-42", Value::Int(-42) ; "negative int")]
    #[test_case(ValueType::Float, "2.5", Value::Float(2.5) ; "float")]
    #[test_case(ValueType::Choice(vec!["Debug".into(), "Release".into()]), "release", Value::from("Release") ; "choice is canonicalized")]
    #[test_case(ValueType::List(Box::new(ValueType::Int)), "1,2", Value::from(vec![1_i64, 2]) ; "comma list")]
    fn test_convert(value_type: ValueType, raw: &str, expected: Value) {
        assert_eq!(value_type.convert(raw), Ok(expected));
    }

    #[test]
    fn test_convert_failure_names_the_bad_part() {
        assert_eq!(ValueType::Int.convert("12x"), Err("12x".to_string()));
        assert_eq!(
            ValueType::List(Box::new(ValueType::Int)).convert("1,x"),
            Err("x".to_string())
        );
    }

    #[test]
    fn test_convert_many_uses_element_type() {
        let raws = vec!["db=string".to_string(), "port=number".to_string()];
        assert_eq!(
            ValueType::list_of_str().convert_many(&raws),
            Ok(Value::from(vec!["db=string", "port=number"]))
        );
        assert_eq!(
            ValueType::Int.convert_many(&["1".to_string(), "2".to_string()]),
            Ok(Value::from(vec![1_i64, 2]))
        );
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(ValueType::Bool.zero_value(), Value::Bool(false));
        assert_eq!(ValueType::Int.zero_value(), Value::Int(0));
        assert!(ValueType::Str.zero_value().is_null());
        assert!(ValueType::list_of_str().zero_value().is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "[a, b]");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            ValueType::Choice(vec!["a".into(), "b".into()]).to_string(),
            "one of a|b"
        );
    }
}
