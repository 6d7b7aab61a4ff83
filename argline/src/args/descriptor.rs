// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{DescriptorError, Value, ValueType};
use std::collections::HashSet;

pub const LONG_SWITCH_PREFIX: &str = "--";
pub const SHORT_SWITCH_PREFIX: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Must resolve to a value. Filled positionally unless explicit.
    Required,
    /// Only ever set by name.
    ExplicitOptional,
    /// Presence alone sets it to `true`.
    Switch,
    /// Collects leftover positionals, and everything after `--`.
    Variadic,
}

/// "Only usable if `target` resolves to `expected`" (or to anything else, when
/// `negate` is set).
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub target: String,
    pub expected: Value,
    pub negate: bool,
}

/// Static metadata for one option or positional argument. Build one with a constructor
/// ([`Descriptor::required`], [`Descriptor::optional`], [`Descriptor::switch`],
/// [`Descriptor::variadic`]) and chain the builder methods.
///
/// ```
/// use argline::{Descriptor, Value, ValueType};
///
/// let port = Descriptor::optional("port")
///     .short('p')
///     .value_type(ValueType::Int)
///     .default_value(Value::Int(8080))
///     .help("Port to listen on");
/// assert_eq!(port.long_pattern(), "--port");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub name: String,
    pub short_name: Option<char>,
    pub kind: DescriptorKind,
    /// Explicit descriptors are never filled positionally.
    pub is_explicit: bool,
    pub value_type: ValueType,
    /// Used when the switch is present without a value.
    pub default_value: Option<Value>,
    /// Used when nothing was supplied at all.
    pub init_value: Option<Value>,
    pub triggers: Vec<Trigger>,
    /// Carried for the caller's usage printer.
    pub help: Option<String>,
}

impl Descriptor {
    fn new(name: impl Into<String>, kind: DescriptorKind, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            kind,
            is_explicit: matches!(
                kind,
                DescriptorKind::ExplicitOptional | DescriptorKind::Switch
            ),
            value_type,
            default_value: None,
            init_value: None,
            triggers: vec![],
            help: None,
        }
    }

    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, DescriptorKind::Required, ValueType::Str)
    }

    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, DescriptorKind::ExplicitOptional, ValueType::Str)
    }

    #[must_use]
    pub fn switch(name: impl Into<String>) -> Self {
        Self::new(name, DescriptorKind::Switch, ValueType::Bool).default_value(true)
    }

    #[must_use]
    pub fn variadic(name: impl Into<String>) -> Self {
        Self::new(name, DescriptorKind::Variadic, ValueType::list_of_str())
    }

    #[must_use]
    pub fn short(mut self, short_name: char) -> Self {
        self.short_name = Some(short_name);
        self
    }

    /// An explicit [`DescriptorKind::Required`] must be given by name.
    #[must_use]
    pub fn explicit(mut self, is_explicit: bool) -> Self {
        self.is_explicit = is_explicit;
        self
    }

    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn init_value(mut self, value: impl Into<Value>) -> Self {
        self.init_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Usable only if `target` resolves to `expected`.
    #[must_use]
    pub fn trigger(mut self, target: impl Into<String>, expected: impl Into<Value>) -> Self {
        self.triggers.push(Trigger {
            target: target.into(),
            expected: expected.into(),
            negate: false,
        });
        self
    }

    /// Usable only if `target` does not resolve to `expected`.
    #[must_use]
    pub fn trigger_not(
        mut self,
        target: impl Into<String>,
        expected: impl Into<Value>,
    ) -> Self {
        self.triggers.push(Trigger {
            target: target.into(),
            expected: expected.into(),
            negate: true,
        });
        self
    }

    #[must_use]
    pub fn is_switch(&self) -> bool { self.kind == DescriptorKind::Switch }

    #[must_use]
    pub fn is_variadic(&self) -> bool { self.kind == DescriptorKind::Variadic }

    /// Required and not explicit, so positional tokens can fill it.
    #[must_use]
    pub fn is_positional(&self) -> bool {
        self.kind == DescriptorKind::Required && !self.is_explicit
    }

    #[must_use]
    pub fn long_pattern(&self) -> String { format!("{LONG_SWITCH_PREFIX}{}", self.name) }

    #[must_use]
    pub fn short_pattern(&self) -> Option<String> {
        self.short_name
            .map(|short_name| format!("{SHORT_SWITCH_PREFIX}{short_name}"))
    }

    /// Exact match against `--name` or `-c`.
    #[must_use]
    pub fn matches_switch(&self, token: &str) -> bool {
        if let Some(name) = token.strip_prefix(LONG_SWITCH_PREFIX) {
            return name == self.name;
        }
        let mut chars = match token.strip_prefix(SHORT_SWITCH_PREFIX) {
            Some(rest) => rest.chars(),
            None => return false,
        };
        matches!(
            (chars.next(), chars.next(), self.short_name),
            (Some(ch), None, Some(short_name)) if ch == short_name
        )
    }

    /// Position in the ordering contract: positional required, then positional
    /// required with an init value, variadic, explicit required, everything else.
    fn sort_rank(&self) -> u8 {
        match (self.kind, self.is_explicit) {
            (DescriptorKind::Required, false) if self.init_value.is_none() => 0,
            (DescriptorKind::Required, false) => 1,
            (DescriptorKind::Variadic, _) => 2,
            (DescriptorKind::Required, true) => 3,
            _ => 4,
        }
    }
}

/// Index of a [`Descriptor`] in its [`DescriptorSet`], in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(pub usize);

/// A [`Trigger`] with its target looked up once.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrigger {
    pub target: DescriptorId,
    pub expected: Value,
    pub negate: bool,
}

/// A validated collection of descriptors. Names and short names are unique, there is at
/// most one variadic descriptor, and every trigger points at a descriptor in the set.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSet {
    descriptors: Vec<Descriptor>,
    triggers: Vec<Vec<ResolvedTrigger>>,
    order: Vec<DescriptorId>,
    variadic: Option<DescriptorId>,
}

impl DescriptorSet {
    /// # Errors
    ///
    /// Returns a [`DescriptorError`] for the first broken invariant found.
    pub fn new(descriptors: Vec<Descriptor>) -> Result<Self, DescriptorError> {
        let mut names = HashSet::new();
        let mut short_names = HashSet::new();
        let mut variadic: Option<DescriptorId> = None;

        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.name.is_empty() {
                return Err(DescriptorError::EmptyName { index });
            }
            if !names.insert(descriptor.name.as_str()) {
                return Err(DescriptorError::DuplicateName {
                    name: descriptor.name.clone(),
                });
            }
            if let Some(short_name) = descriptor.short_name
                && !short_names.insert(short_name)
            {
                return Err(DescriptorError::DuplicateShortName { short_name });
            }
            if descriptor.is_variadic() {
                if let Some(DescriptorId(first)) = variadic {
                    return Err(DescriptorError::MultipleVariadic {
                        first: descriptors[first].name.clone(),
                        second: descriptor.name.clone(),
                    });
                }
                variadic = Some(DescriptorId(index));
            }
        }

        let triggers = descriptors
            .iter()
            .map(|descriptor| {
                descriptor
                    .triggers
                    .iter()
                    .map(|trigger| {
                        let target = descriptors
                            .iter()
                            .position(|it| it.name == trigger.target)
                            .ok_or_else(|| DescriptorError::UnknownTriggerTarget {
                                name: descriptor.name.clone(),
                                target: trigger.target.clone(),
                            })?;
                        Ok(ResolvedTrigger {
                            target: DescriptorId(target),
                            expected: trigger.expected.clone(),
                            negate: trigger.negate,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut order: Vec<DescriptorId> = (0..descriptors.len()).map(DescriptorId).collect();
        order.sort_by_key(|DescriptorId(index)| descriptors[*index].sort_rank());

        Ok(Self {
            descriptors,
            triggers,
            order,
            variadic,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize { self.descriptors.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.descriptors.is_empty() }

    /// # Panics
    ///
    /// If `id` did not come from this set.
    #[must_use]
    pub fn get(&self, id: DescriptorId) -> &Descriptor { &self.descriptors[id.0] }

    /// Declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (DescriptorId, &Descriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(index, it)| (DescriptorId(index), it))
    }

    /// Positional consumption and usage order. See the [`crate::args`] docs.
    pub fn ordered(&self) -> impl Iterator<Item = (DescriptorId, &Descriptor)> {
        self.order.iter().map(|id| (*id, self.get(*id)))
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<DescriptorId> {
        self.descriptors
            .iter()
            .position(|it| it.name == name)
            .map(DescriptorId)
    }

    /// The descriptor whose `--name` or `-c` is exactly `token`.
    #[must_use]
    pub fn find_switch(&self, token: &str) -> Option<DescriptorId> {
        self.descriptors
            .iter()
            .position(|it| it.matches_switch(token))
            .map(DescriptorId)
    }

    #[must_use]
    pub fn variadic(&self) -> Option<DescriptorId> { self.variadic }

    #[must_use]
    pub fn triggers(&self, id: DescriptorId) -> &[ResolvedTrigger] { &self.triggers[id.0] }
}
