// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Command line tokenizer and declarative argument binder.
//!
//! 1. [`tokenize()`] splits a line into tokens (see [`tokenizer`] for the grammar).
//! 2. The caller describes what it accepts as a [`DescriptorSet`].
//! 3. [`bind()`] matches the tokens against the set and returns [`BoundValues`], or an
//!    [`ArgsError`] without committing anything.
//!
//! # Matching
//!
//! Tokens are consumed front to back:
//! - `--name` or `-c` flags the descriptor. Unless it is a [`DescriptorKind::Switch`],
//!   the next token becomes its value if that token is not a switch and not `--`.
//!   `--name=value` and `-c=value` work too.
//! - `--` sends every remaining token to the variadic descriptor.
//! - An unknown switch is unrecognized.
//! - Anything else is positional. It fills the next required, non explicit descriptor
//!   with no value yet, else goes to the variadic descriptor, else it is unrecognized
//!   (together with the token after it, when that is not a switch).
//!
//! # Ordering
//!
//! [`DescriptorSet::ordered()`] sorts descriptors (stable) as:
//! 1. Required, non explicit, no init value.
//! 2. Required, non explicit, with an init value.
//! 3. Variadic.
//! 4. Required, explicit.
//! 5. Everything else.
//!
//! Positional tokens fill descriptors in this order, and validation errors are reported
//! in this order.

// Attach.
pub mod binder;
pub mod descriptor;
pub mod error;
pub mod parse_item;
pub mod tokenizer;
pub mod value;

// Re-export.
pub use binder::*;
pub use descriptor::*;
pub use error::*;
pub use parse_item::*;
pub use tokenizer::*;
pub use value::*;
