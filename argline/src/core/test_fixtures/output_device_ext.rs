// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{OutputDevice, StdMutex, StdoutMock};
use std::sync::Arc;

/// Render into memory instead of the terminal.
pub trait OutputDeviceExt {
    /// The [`StdoutMock`] sees everything written to the returned device and its clones.
    fn new_mock() -> (OutputDevice, StdoutMock);
}

impl OutputDeviceExt for OutputDevice {
    fn new_mock() -> (OutputDevice, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let device = OutputDevice {
            resource: Arc::new(StdMutex::new(stdout_mock.clone())),
            is_mock: true,
        };
        (device, stdout_mock)
    }
}

#[cfg(test)]
mod tests {
    use super::OutputDeviceExt;
    use crate::{OutputDevice, Patch, RenderOp, lock_output_device_as_mut};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_patch_flushed_through_clone_lands_in_mock() {
        let (device, mock) = OutputDevice::new_mock();
        let clone = device.clone();

        let patch = Patch::from(vec![
            RenderOp::HideCursor,
            RenderOp::Print("$ ls\n".into()),
            RenderOp::ShowCursor,
        ]);
        patch.flush(lock_output_device_as_mut!(clone)).unwrap();

        assert!(device.is_mock);
        assert_eq!(mock.get_copy_of_buffer_as_string(), "\x1b[?25l$ ls\r\n\x1b[?25h");
        assert_eq!(mock.get_copy_of_buffer_as_string_strip_ansi(), "$ ls\n");
    }
}
