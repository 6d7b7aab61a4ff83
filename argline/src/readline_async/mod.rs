// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Async line editor
//!
//! [`ReadlineAsyncContext`] is the entry point: it reads lines, passwords and single key
//! presses from the terminal while other tasks print above the prompt through
//! [`SharedWriter`]s. The pieces it is built from are public too:
//!
//! - [`Readline`] runs the reading sessions and the output monitor task.
//! - [`LineState`] turns every [`Edit`] into a [`Patch`] of render ops, without I/O.
//! - [`TerminalPoint`] and [`WidthTable`] do the wide char aware geometry.
//! - [`History`], [`KeyBindings`], [`CompletionSource`] and [`SecureBuffer`] plug into
//!   the editor.

use crate::StdMutex;
use std::sync::Arc;

// Attach sources.
pub mod completion;
pub mod key_bindings;
pub mod line_state;
pub mod patch;
pub mod readline;
pub mod readline_async_api;
pub mod readline_history;
pub mod secure_buffer;
pub mod terminal_coordinates;

// Re-export.
pub use completion::*;
pub use key_bindings::*;
pub use line_state::*;
pub use patch::*;
pub use readline::*;
pub use readline_async_api::*;
pub use readline_history::*;
pub use secure_buffer::*;
pub use terminal_coordinates::*;

pub const HISTORY_SIZE_MAX: usize = 1_000;

/// Room in the channel between [`SharedWriter`]s and the output monitor task.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_000;

pub type SafeLineState = Arc<StdMutex<LineState>>;
pub type SafeHistory = Arc<StdMutex<History>>;
