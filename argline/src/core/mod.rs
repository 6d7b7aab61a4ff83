// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Plumbing shared by the argument binder and the line editor: ANSI sequences, terminal
//! I/O devices, TTY detection, logging setup, and test fixtures.

// Attach sources.
pub mod ansi;
pub mod decl_macros;
pub mod log;
pub mod term;
pub mod terminal_io;
pub mod test_fixtures;

// Re-export.
pub use ansi::*;
pub use log::*;
pub use term::*;
pub use terminal_io::*;
pub use test_fixtures::*;
