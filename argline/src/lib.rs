// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # argline
//!
//! Two coupled pieces for building command line programs and REPLs:
//!
//! 1. [`args`]: a command line tokenizer (quotes, escapes, glued fragments) and a
//!    declarative argument binder. The caller describes options and positional arguments
//!    as [`Descriptor`]s, collects them into a [`DescriptorSet`], and calls [`bind()`] to
//!    get [`BoundValues`] or a structured [`ArgsError`].
//! 2. [`readline_async`]: an async, wide-char aware line editor. It tracks the prompt and
//!    command text as [`TerminalPoint`] coordinates, turns every edit into a [`Patch`]
//!    of ANSI render ops, supports history, tab completion cycling, password input, and
//!    lets other tasks print above the prompt through a [`SharedWriter`].
//!
//! The two meet in completion: a [`DescriptorSet`] is a [`CompletionSource`], and the
//! completion engine splits the typed prefix with the same tokenizer that [`bind_line()`]
//! uses.
//!
//! # Binding arguments
//!
//! ```
//! use argline::{Descriptor, DescriptorSet, Value, bind};
//!
//! let set = DescriptorSet::new(vec![
//!     Descriptor::required("path"),
//!     Descriptor::optional("comment").short('m'),
//! ])
//! .unwrap();
//!
//! let bound = bind(&set, &["current_path", "-m", "123"]).unwrap();
//! assert_eq!(bound.get("path"), Some(&Value::from("current_path")));
//! assert_eq!(bound.get("comment"), Some(&Value::from("123")));
//! ```
//!
//! # Reading lines
//!
//! ```no_run
//! use argline::{ReadlineAsyncContext, ReadlineEvent, ReadlineOptions};
//!
//! # async fn sample() -> miette::Result<()> {
//! let Some(mut rl_ctx) = ReadlineAsyncContext::try_new(ReadlineOptions::default())? else {
//!     return Ok(());
//! };
//! while let ReadlineEvent::Line(line) = rl_ctx.read_line().await? {
//!     argline::rla_println!(rl_ctx, "You typed: {line}");
//! }
//! rl_ctx.request_shutdown(None).await?;
//! # Ok(())
//! # }
//! ```

// Enforce strict error handling in production library code only. Tests and examples are
// allowed to use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules.
pub mod args;
pub mod core;
pub mod readline_async;

// Re-export.
pub use args::*;
pub use core::*;
pub use readline_async::*;
