// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ArgsError, Descriptor, DescriptorId, DescriptorKind, DescriptorSet,
            LONG_SWITCH_PREFIX, ParseItem, SHORT_SWITCH_PREFIX, TokenizerOptions,
            TriggerViolation, UnmatchedArgument, Value, tokenize_with};
use indexmap::{IndexMap, IndexSet};

/// Ends option parsing. Everything after it goes to the variadic descriptor.
pub const END_OF_OPTIONS: &str = "--";
pub const ASSIGNMENT: char = '=';

/// Receives the two phase commit of [`bind_into`].
pub trait BindTarget {
    /// Phase one, called for every descriptor with its init value (or the zero value).
    fn init_value(&mut self, descriptor: &Descriptor, value: &Value);

    /// Phase two, called for every descriptor with its resolved value.
    fn set_value(&mut self, descriptor: &Descriptor, value: &Value);
}

/// Result of a successful [`bind()`]. Every descriptor has a value, in declaration
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundValues {
    values: IndexMap<String, Value>,
    supplied: IndexSet<String>,
}

impl BoundValues {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> { self.values.get(name) }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> { self.get(name)?.as_bool() }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> { self.get(name)?.as_str() }

    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> { self.get(name)?.as_int() }

    #[must_use]
    pub fn get_list(&self, name: &str) -> Option<&[Value]> { self.get(name)?.as_list() }

    /// The user gave this descriptor on the command line, as opposed to it falling
    /// back to an init or zero value.
    #[must_use]
    pub fn was_supplied(&self, name: &str) -> bool { self.supplied.contains(name) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize { self.values.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

impl BindTarget for IndexMap<String, Value> {
    fn init_value(&mut self, descriptor: &Descriptor, value: &Value) {
        self.insert(descriptor.name.clone(), value.clone());
    }

    fn set_value(&mut self, descriptor: &Descriptor, value: &Value) {
        self.insert(descriptor.name.clone(), value.clone());
    }
}

/// Match `tokens` (program name excluded) against `set`.
///
/// ```
/// use argline::{Descriptor, DescriptorSet, bind};
///
/// let set = DescriptorSet::new(vec![
///     Descriptor::switch("list").short('l'),
///     Descriptor::variadic("arguments"),
/// ])
/// .unwrap();
/// let bound = bind(&set, &["-l", "--", "db=string", "port=number"]).unwrap();
/// assert_eq!(bound.get_bool("list"), Some(true));
/// assert_eq!(bound.get_list("arguments").map(<[_]>::len), Some(2));
/// ```
///
/// # Errors
///
/// The first of these checks that fails, in this order:
/// 1. [`ArgsError::UnrecognizedArguments`] listing every token nothing claimed.
/// 2. [`ArgsError::MissingValue`] for a switch given without a value and no default.
/// 3. [`ArgsError::MissingValue`] for a required descriptor that resolved to nothing.
/// 4. [`ArgsError::InvalidValue`] for a value that does not convert.
/// 5. [`ArgsError::TriggerViolation`] for the first supplied descriptor whose trigger
///    is not met.
pub fn bind<S: AsRef<str>>(
    set: &DescriptorSet,
    tokens: &[S],
) -> Result<BoundValues, ArgsError> {
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    let mut matcher = Matcher::new(set);
    matcher.match_tokens(&tokens);

    tracing::debug!(
        message = "bind matched tokens",
        tokens = tokens.len(),
        supplied = matcher.items.iter().filter(|it| it.is_supplied()).count(),
        unmatched = matcher.unmatched.len()
    );

    matcher.validate()
}

/// [`tokenize_with`] then [`bind()`].
///
/// # Errors
///
/// [`ArgsError::Tokenize`], or anything [`bind()`] returns.
pub fn bind_line(
    set: &DescriptorSet,
    line: &str,
    options: &TokenizerOptions,
) -> Result<BoundValues, ArgsError> {
    let tokens = tokenize_with(line, options)?;
    bind(set, &tokens)
}

/// [`bind()`], then commit into `target`: first every init value, then every resolved
/// value. `target` is untouched when binding fails.
///
/// # Errors
///
/// Anything [`bind()`] returns.
pub fn bind_into<S: AsRef<str>>(
    set: &DescriptorSet,
    tokens: &[S],
    target: &mut impl BindTarget,
) -> Result<BoundValues, ArgsError> {
    let bound = bind(set, tokens)?;

    for (id, descriptor) in set.iter() {
        target.init_value(descriptor, &ParseItem::new(id, descriptor).init_value());
    }
    for (_, descriptor) in set.iter() {
        if let Some(value) = bound.get(&descriptor.name) {
            target.set_value(descriptor, value);
        }
    }

    Ok(bound)
}

/// `--x...` or `-c...` where `c` is alphabetic. `-5`, `-` and `--` are not switches.
#[must_use]
pub fn is_switch_like(token: &str) -> bool {
    if let Some(rest) = token.strip_prefix(LONG_SWITCH_PREFIX) {
        return !rest.is_empty();
    }
    token
        .strip_prefix(SHORT_SWITCH_PREFIX)
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_alphabetic)
}

/// Strip one pair of matching outer quotes.
#[must_use]
pub fn trim_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value
                .strip_prefix(quote)
                .and_then(|it| it.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

struct Matcher<'a> {
    set: &'a DescriptorSet,
    items: Vec<ParseItem<'a>>,
    unmatched: Vec<UnmatchedArgument>,
}

impl<'a> Matcher<'a> {
    fn new(set: &'a DescriptorSet) -> Self {
        Self {
            set,
            items: set
                .iter()
                .map(|(id, descriptor)| ParseItem::new(id, descriptor))
                .collect(),
            unmatched: vec![],
        }
    }

    fn item_mut(&mut self, id: DescriptorId) -> &mut ParseItem<'a> { &mut self.items[id.0] }

    fn match_tokens(&mut self, tokens: &[&str]) {
        let mut index = 0;
        while let Some(&token) = tokens.get(index) {
            index += 1;

            if token == END_OF_OPTIONS {
                self.take_rest(&tokens[index..]);
                return;
            }

            if let Some(id) = self.set.find_switch(token) {
                let next = tokens
                    .get(index)
                    .copied()
                    .filter(|it| self.can_be_switch_value(it));
                let item = self.item_mut(id);
                item.has_switch_flag = true;
                if !item.descriptor.is_switch()
                    && let Some(value) = next
                {
                    item.push_value(trim_quotes(value));
                    index += 1;
                }
                continue;
            }

            if let Some((name, value)) = token.split_once(ASSIGNMENT)
                && let Some(id) = self.set.find_switch(name)
            {
                let item = self.item_mut(id);
                item.has_switch_flag = true;
                item.push_value(trim_quotes(value));
                continue;
            }

            if is_switch_like(token) {
                self.unmatched.push(UnmatchedArgument {
                    token: token.to_string(),
                    value: None,
                });
                continue;
            }

            if let Some(id) = self.next_positional().or(self.set.variadic()) {
                self.item_mut(id).push_value(token);
                continue;
            }

            let value = tokens.get(index).copied().filter(|it| is_value_token(it));
            if value.is_some() {
                index += 1;
            }
            self.unmatched.push(UnmatchedArgument {
                token: token.to_string(),
                value: value.map(ToString::to_string),
            });
        }
    }

    /// A token follows a switch as its value unless it is `--` or a switch of this set.
    fn can_be_switch_value(&self, token: &str) -> bool {
        let name = token.split_once(ASSIGNMENT).map_or(token, |(name, _)| name);
        token != END_OF_OPTIONS && self.set.find_switch(name).is_none()
    }

    /// Everything after `--`.
    fn take_rest(&mut self, rest: &[&str]) {
        match self.set.variadic() {
            Some(id) => {
                let item = self.item_mut(id);
                for token in rest {
                    item.push_value(*token);
                }
            }
            None => self.unmatched.extend(rest.iter().map(|token| UnmatchedArgument {
                token: (*token).to_string(),
                value: None,
            })),
        }
    }

    /// Next positional required descriptor, in sorted order, that has no value yet.
    fn next_positional(&self) -> Option<DescriptorId> {
        self.set
            .ordered()
            .find(|(id, descriptor)| descriptor.is_positional() && self.items[id.0].is_unset())
            .map(|(id, _)| id)
    }

    fn validate(self) -> Result<BoundValues, ArgsError> {
        if !self.unmatched.is_empty() {
            return Err(ArgsError::UnrecognizedArguments {
                items: self.unmatched,
            });
        }

        let ordered: Vec<&ParseItem<'_>> = self
            .set
            .ordered()
            .map(|(id, _)| &self.items[id.0])
            .collect();

        if let Some(item) = ordered.iter().find(|it| {
            it.has_switch_flag && it.is_unset() && it.descriptor.default_value.is_none()
        }) {
            return Err(missing_value(item));
        }

        if let Some(item) = ordered.iter().find(|it| {
            it.descriptor.kind == DescriptorKind::Required
                && it.is_unset()
                && it.descriptor.default_value.is_none()
                && it.descriptor.init_value.is_none()
        }) {
            return Err(missing_value(item));
        }

        let actual_values = self
            .items
            .iter()
            .map(ParseItem::actual_value)
            .collect::<Result<Vec<_>, _>>()?;

        for item in ordered.iter().filter(|it| it.is_supplied()) {
            for trigger in self.set.triggers(item.id) {
                let actual = &actual_values[trigger.target.0];
                if (*actual == trigger.expected) != trigger.negate {
                    continue;
                }
                let violation = TriggerViolation {
                    name: item.descriptor.name.clone(),
                    other: self.set.get(trigger.target).name.clone(),
                    expected: trigger.expected.clone(),
                    negate: trigger.negate,
                    other_is_switch: self.set.get(trigger.target).is_switch(),
                };
                tracing::debug!(message = "trigger violated", %violation, %actual);
                return Err(ArgsError::TriggerViolation(violation));
            }
        }

        let mut bound = BoundValues::default();
        for (item, value) in self.items.iter().zip(actual_values) {
            if item.is_supplied() {
                bound.supplied.insert(item.descriptor.name.clone());
            }
            bound.values.insert(item.descriptor.name.clone(), value);
        }
        Ok(bound)
    }
}

/// Can pair with a leftover positional as its value.
fn is_value_token(token: &str) -> bool { token != END_OF_OPTIONS && !is_switch_like(token) }

fn missing_value(item: &ParseItem<'_>) -> ArgsError {
    ArgsError::MissingValue {
        name: item.descriptor.name.clone(),
    }
}
