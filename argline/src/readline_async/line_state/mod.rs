// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Line editing state machine for async readline.
//!
//! This module implements the render engine that powers [`Readline`]. Every change to
//! the line is an [`Edit`] applied to a [`LineState`], and every application returns a
//! [`Patch`] of render ops. Computing a patch does no I/O, flushing it is a separate step
//! done by the caller while it holds the output device.
//!
//! # Architecture
//!
//! | Module           | Responsibility                                                 |
//! |------------------|----------------------------------------------------------------|
//! | `core`           | [`LineState`] struct, [`InputMode`], geometry of prompt & line |
//! | `edit`           | [`Edit`], [`EditContext`], [`LineState::apply`]                |
//! | `event_handlers` | Terminal event and key chord dispatch                          |
//! | `output`         | Output interleaving, password mode, submit / interrupt / EOF   |
//! | `render`         | Minimal repaint, scrolling, erase                              |
//!
//! [`Readline`]: crate::Readline
//! [`Patch`]: crate::Patch

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Private modules organized by functional responsibility.
mod core;
mod edit;
mod event_handlers;
mod output;
mod render;

// Public re-exports (expose stable API).
pub use core::*;
pub use edit::*;
pub use event_handlers::*;
pub use render::*;
