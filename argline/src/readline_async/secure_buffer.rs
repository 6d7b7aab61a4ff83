// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::ReadlineError;
use std::{fmt::{Debug, Formatter, Result as FmtResult},
          ops::Range};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const SECURE_BUFFER_INITIAL_CAPACITY: usize = 64;

/// Holds a password while it is typed. The contents are wiped when the buffer is dropped,
/// and every time it has to grow, so no stale copy is left behind in freed memory. Once
/// [`SecureBuffer::seal`]ed it is read only.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureBuffer {
    text: String,
    read_only: bool,
}

impl Default for SecureBuffer {
    fn default() -> Self { Self::new() }
}

impl Debug for SecureBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SecureBuffer")
            .field("len", &self.len())
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl SecureBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::with_capacity(SECURE_BUFFER_INITIAL_CAPACITY),
            read_only: false,
        }
    }

    /// Length in chars.
    #[must_use]
    pub fn len(&self) -> usize { self.text.chars().count() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.text.is_empty() }

    #[must_use]
    pub fn is_read_only(&self) -> bool { self.read_only }

    pub fn seal(&mut self) { self.read_only = true; }

    /// The secret itself. Don't hold on to copies of it.
    #[must_use]
    pub fn as_unsecure_str(&self) -> &str { &self.text }

    /// What gets painted: one `mask` per char.
    #[must_use]
    pub fn masked(&self, mask: char) -> String { std::iter::repeat_n(mask, self.len()).collect() }

    /// # Errors
    ///
    /// [`ReadlineError::InvalidOperation`] once sealed.
    pub fn insert_str(&mut self, char_index: usize, text: &str) -> Result<(), ReadlineError> {
        self.check_writable()?;
        self.reserve_zeroizing(text.len());
        let byte_index = self.byte_index(char_index);
        self.text.insert_str(byte_index, text);
        Ok(())
    }

    /// # Errors
    ///
    /// [`ReadlineError::InvalidOperation`] once sealed.
    pub fn remove(&mut self, char_index: usize) -> Result<(), ReadlineError> {
        self.remove_range(char_index..char_index + 1)
    }

    /// Removes the chars in `range`, clamped to the buffer.
    ///
    /// # Errors
    ///
    /// [`ReadlineError::InvalidOperation`] once sealed.
    pub fn remove_range(&mut self, range: Range<usize>) -> Result<(), ReadlineError> {
        self.check_writable()?;
        let start = self.byte_index(range.start);
        let end = self.byte_index(range.end);
        if start < end {
            self.text.replace_range(start..end, "");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`ReadlineError::InvalidOperation`] once sealed.
    pub fn clear(&mut self) -> Result<(), ReadlineError> {
        self.check_writable()?;
        self.text.zeroize();
        Ok(())
    }

    fn check_writable(&self) -> Result<(), ReadlineError> {
        if self.read_only {
            return Err(ReadlineError::InvalidOperation("secure buffer is read only"));
        }
        Ok(())
    }

    /// Grow by copying into a bigger allocation and wiping the old one, instead of
    /// letting `String` reallocate and free the old bytes as is.
    fn reserve_zeroizing(&mut self, additional: usize) {
        let needed = self.text.len() + additional;
        if needed <= self.text.capacity() {
            return;
        }
        let capacity = needed.max(self.text.capacity() * 2);
        let mut grown = String::with_capacity(capacity);
        grown.push_str(&self.text);
        let mut old = std::mem::replace(&mut self.text, grown);
        old.zeroize();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(index, _)| index)
    }
}
