// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::core::LineState;
use crate::{Edit, EditAction, EditContext, KeyBindings, KeyChord, Patch, ReadlineError,
            ReadlineEvent};
use crossterm::event::{Event, KeyEvent};

/// What one input event did: the repaint, and the event that ends the read, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyOutcome {
    pub patch: Patch,
    pub event: Option<ReadlineEvent>,
}

impl From<Patch> for KeyOutcome {
    fn from(patch: Patch) -> Self { Self { patch, event: None } }
}

impl From<(Patch, ReadlineEvent)> for KeyOutcome {
    fn from((patch, event): (Patch, ReadlineEvent)) -> Self {
        Self {
            patch,
            event: Some(event),
        }
    }
}

impl LineState {
    /// Dispatch a terminal event. Keys go through `bindings`, a resize and a paste
    /// become the matching [`Edit`]. Everything else is ignored.
    ///
    /// # Errors
    ///
    /// Whatever [`LineState::apply`] returns.
    pub fn handle_event(
        &mut self,
        event: Event,
        bindings: &KeyBindings,
        ctx: &mut EditContext<'_>,
    ) -> Result<KeyOutcome, ReadlineError> {
        match event {
            Event::Key(key_event) => self.handle_key_event(&key_event, bindings, ctx),
            Event::Resize(width, height) => Ok(self
                .apply(
                    Edit::Resize {
                        width,
                        height,
                        cursor: None,
                    },
                    ctx,
                )?
                .into()),
            Event::Paste(text) => Ok(self.apply(Edit::InsertText(text), ctx)?.into()),
            _ => Ok(KeyOutcome::default()),
        }
    }

    /// A bound chord runs its [`EditAction`]. An unbound plain char is inserted.
    ///
    /// # Errors
    ///
    /// Whatever [`LineState::apply`] returns.
    pub fn handle_key_event(
        &mut self,
        key_event: &KeyEvent,
        bindings: &KeyBindings,
        ctx: &mut EditContext<'_>,
    ) -> Result<KeyOutcome, ReadlineError> {
        let Some(chord) = KeyChord::from_key_event(key_event) else {
            return Ok(KeyOutcome::default());
        };
        if let Some(action) = bindings.lookup(&chord) {
            return self.handle_action(action, ctx);
        }
        match chord.insertable_char() {
            Some(ch) => Ok(self.apply(Edit::InsertText(ch.to_string()), ctx)?.into()),
            None => {
                tracing::debug!(message = "unbound key", chord = ?chord);
                Ok(KeyOutcome::default())
            }
        }
    }

    /// # Errors
    ///
    /// Whatever [`LineState::apply`] returns.
    pub fn handle_action(
        &mut self,
        action: EditAction,
        ctx: &mut EditContext<'_>,
    ) -> Result<KeyOutcome, ReadlineError> {
        let edit = match action {
            EditAction::Submit => return Ok(self.submit(ctx.history).into()),
            EditAction::Interrupt => return Ok(self.interrupt(ctx.history).into()),
            EditAction::EndOfFile if self.is_empty() => return Ok(self.end_of_file().into()),
            EditAction::EndOfFile | EditAction::Delete => Edit::Delete,
            EditAction::InsertNewline => Edit::InsertText("\n".into()),
            EditAction::Backspace => Edit::Backspace,
            EditAction::MoveLeft => Edit::MoveLeft,
            EditAction::MoveRight => Edit::MoveRight,
            EditAction::MoveWordLeft => Edit::MoveWordLeft,
            EditAction::MoveWordRight => Edit::MoveWordRight,
            EditAction::MoveHome => Edit::MoveHome,
            EditAction::MoveEnd => Edit::MoveEnd,
            EditAction::HistoryPrev => Edit::HistoryPrev,
            EditAction::HistoryNext => Edit::HistoryNext,
            EditAction::CompletionNext => Edit::CompletionNext,
            EditAction::CompletionPrev => Edit::CompletionPrev,
            EditAction::ClearScreen => Edit::ClearScreen,
            EditAction::DeleteToStart => Edit::DeleteToStart,
            EditAction::DeleteWordBefore => Edit::DeleteWordBefore,
        };
        Ok(self.apply(edit, ctx)?.into())
    }
}
