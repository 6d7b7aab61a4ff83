// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tokio tracing setup. Logs can go to `stdout`, `stderr`, a file, or a
//! [`crate::SharedWriter`] so that log lines scroll above the prompt instead of
//! clobbering it.

// Attach.
pub mod rolling_file_appender_impl;
pub mod tracing_config;
pub mod tracing_init;

// Re-export.
pub use tracing_config::*;
pub use tracing_init::*;
