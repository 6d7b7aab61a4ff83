// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{SafeRawTerminal, SendRawTerminal, StdMutex};
use std::sync::{Arc, MutexGuard};

pub type LockedOutputDevice<'a> = &'a mut dyn std::io::Write;

/// Lock an [`OutputDevice`] and get a `&mut dyn Write` to flush a [`crate::Patch`] into.
/// The lock is held until the end of the enclosing statement or block, so don't use it
/// twice in the same scope, it will deadlock.
///
/// ```
/// use argline::{LockedOutputDevice, OutputDevice, Patch, RenderOp,
///               lock_output_device_as_mut};
/// let device = OutputDevice::new_stdout();
/// let patch = Patch::from(vec![RenderOp::Print("hi\n".into())]);
/// {
///     let term: LockedOutputDevice<'_> = lock_output_device_as_mut!(device);
///     patch.flush(term).ok();
/// }
/// ```
#[macro_export]
macro_rules! lock_output_device_as_mut {
    ($device:expr) => {
        &mut *$device.lock()
    };
}

/// Where the line editor paints. Clones share the writer, so the reading loop, the
/// output monitor task and the session guard all paint into the same place under one
/// lock.
///
/// `is_mock` is `true` for devices made by [`crate::OutputDeviceExt::new_mock`]. The
/// editor never switches raw mode on or asks for the cursor position of a mock.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct OutputDevice {
    pub resource: SafeRawTerminal,
    pub is_mock: bool,
}

impl Default for OutputDevice {
    fn default() -> Self { Self::new_stdout() }
}

impl OutputDevice {
    #[must_use]
    pub fn new_stdout() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(std::io::stdout())),
            is_mock: false,
        }
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn lock(&self) -> MutexGuard<'_, SendRawTerminal> { self.resource.lock().unwrap() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_device_is_real_and_shared_by_clones() {
        let device = OutputDevice::default();
        let clone = device.clone();
        assert!(!device.is_mock);
        assert!(Arc::ptr_eq(&device.resource, &clone.resource));
    }
}
