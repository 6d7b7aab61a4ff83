// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Mocks for the input and output devices, so the line editor can be driven end to end
//! without a real terminal.

// Attach.
mod async_input_stream_mock;
mod input_device_ext_mock;
mod output_device_ext;
mod stdout_mock;

// Re-export.
pub use async_input_stream_mock::*;
pub use input_device_ext_mock::*;
pub use output_device_ext::*;
pub use stdout_mock::*;
