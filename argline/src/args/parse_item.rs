// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ArgsError, Descriptor, DescriptorId, DescriptorKind, Value};

/// Tokens collected for one descriptor during a bind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawValue {
    #[default]
    Unset,
    Single(String),
    /// Variadic descriptors collect one entry per token.
    Many(Vec<String>),
}

/// Per bind state paired 1:1 with a [`Descriptor`]. Lives only for one call to
/// [`crate::bind()`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParseItem<'a> {
    pub descriptor: &'a Descriptor,
    pub id: DescriptorId,
    pub raw_value: RawValue,
    /// `--name` or `-c` was seen.
    pub has_switch_flag: bool,
}

impl<'a> ParseItem<'a> {
    #[must_use]
    pub fn new(id: DescriptorId, descriptor: &'a Descriptor) -> Self {
        Self {
            descriptor,
            id,
            raw_value: RawValue::Unset,
            has_switch_flag: false,
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool { self.raw_value == RawValue::Unset }

    /// Anything at all was given for this descriptor.
    #[must_use]
    pub fn is_supplied(&self) -> bool { self.has_switch_flag || !self.is_unset() }

    /// Variadic descriptors append. Everything else keeps the last value given.
    pub fn push_value(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        if self.descriptor.kind == DescriptorKind::Variadic {
            match &mut self.raw_value {
                RawValue::Many(items) => items.push(raw),
                it => *it = RawValue::Many(vec![raw]),
            }
        } else {
            self.raw_value = RawValue::Single(raw);
        }
    }

    /// Resolution order: the converted raw value, then the default (only if the switch
    /// was given), then the init value, then the zero value of the type.
    ///
    /// # Errors
    ///
    /// [`ArgsError::InvalidValue`] if the raw value does not convert.
    pub fn actual_value(&self) -> Result<Value, ArgsError> {
        let descriptor = self.descriptor;
        let converted = match &self.raw_value {
            RawValue::Single(raw) => Some(descriptor.value_type.convert(raw)),
            RawValue::Many(raws) => Some(descriptor.value_type.convert_many(raws)),
            RawValue::Unset => None,
        };

        if let Some(result) = converted {
            return result.map_err(|value| ArgsError::InvalidValue {
                name: descriptor.name.clone(),
                value,
                expected: descriptor.value_type.to_string(),
            });
        }

        if self.has_switch_flag
            && let Some(default_value) = &descriptor.default_value
        {
            return Ok(default_value.clone());
        }

        Ok(self.init_value())
    }

    /// What the first commit phase assigns.
    #[must_use]
    pub fn init_value(&self) -> Value {
        self.descriptor
            .init_value
            .clone()
            .unwrap_or_else(|| self.descriptor.value_type.zero_value())
    }
}
