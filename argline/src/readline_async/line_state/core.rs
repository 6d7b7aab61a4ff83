// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CompletionCycle, SecureBuffer, TerminalPoint, UnicodeWidthTable, WidthTable,
            display_index, display_text, next_position};

pub const DEFAULT_MASK_CHAR: char = '*';

/// What the keys typed into [`LineState`] are edited into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Into [`LineState::line`], painted as typed.
    Normal,
    /// Into [`LineState::secure`], painted as one `mask` per char. History and
    /// completion are off.
    Password { mask: char },
}

/// The normal prompt and line, put aside while a password is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StashedLine {
    pub prompt: String,
    pub line: String,
    pub cursor: usize,
}

/// This struct actually handles the line editing, and rendering. This works hand in hand
/// with the [`crate::Readline`] to make sure that the line is rendered correctly.
///
/// The prompt and the command text are modeled as [`TerminalPoint`]s: [`Self::anchor`] is
/// the cell where the prompt starts, everything else is derived from it with
/// [`next_position`]. Every edit goes through [`LineState::apply`], which returns the
/// [`crate::Patch`] that brings the screen up to date, without doing any I/O.
#[derive(Debug)]
pub struct LineState {
    /// May contain ANSI styling.
    pub prompt: String,

    /// [`Self::prompt`] without ANSI sequences, used for geometry.
    pub(super) prompt_plain: String,

    /// Command text. Can hold `\n` for multiline commands.
    pub line: String,

    /// Char index into the line being edited ([`Self::line`] or [`Self::secure`]).
    pub cursor: usize,

    /// Cell where the prompt starts.
    pub anchor: TerminalPoint,

    /// `(columns, rows)`.
    pub term_size: (u16, u16),

    pub mode: InputMode,

    /// Only written to in [`InputMode::Password`].
    pub secure: SecureBuffer,

    pub(super) stashed: Option<StashedLine>,

    pub(super) completion: Option<CompletionCycle>,

    /// After pressing enter, should we print the line just submitted?
    pub should_print_line_on_enter: bool,

    /// After pressing `control_c` should we print the line just cancelled?
    pub should_print_line_on_control_c: bool,

    /// Whether the last output printed above the prompt ended with a line feed.
    pub last_line_completed: bool,

    /// Column where the last incomplete output line ends.
    pub last_line_col: i32,

    pub width_table: Box<dyn WidthTable + Send>,
}

impl LineState {
    /// Create a new `LineState` with the given prompt and terminal size.
    ///
    /// The `term_size` parameter accepts a `(u16, u16)` tuple: `(width_cols, height_rows)`.
    #[must_use]
    pub fn new(prompt: String, term_size: (u16, u16)) -> Self {
        let prompt_plain = strip_ansi_escapes::strip_str(&prompt);
        Self {
            prompt,
            prompt_plain,
            line: String::new(),
            cursor: 0,
            anchor: TerminalPoint::default(),
            term_size: (term_size.0.max(1), term_size.1.max(1)),
            mode: InputMode::Normal,
            secure: SecureBuffer::new(),
            stashed: None,
            completion: None,
            should_print_line_on_enter: true,
            should_print_line_on_control_c: false,
            last_line_completed: true,
            last_line_col: 0,
            width_table: Box::new(UnicodeWidthTable),
        }
    }

    #[must_use]
    pub fn with_width_table(mut self, table: Box<dyn WidthTable + Send>) -> Self {
        self.width_table = table;
        self
    }

    #[must_use]
    pub fn width(&self) -> u16 { self.term_size.0 }

    #[must_use]
    pub fn height(&self) -> u16 { self.term_size.1 }

    #[must_use]
    pub fn is_password_mode(&self) -> bool { matches!(self.mode, InputMode::Password { .. }) }

    #[must_use]
    pub fn completion(&self) -> Option<&CompletionCycle> { self.completion.as_ref() }

    pub(super) fn set_prompt_text(&mut self, prompt: &str) {
        prompt.clone_into(&mut self.prompt);
        self.prompt_plain = strip_ansi_escapes::strip_str(prompt);
    }

    /// Length in chars of the line being edited.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.mode {
            InputMode::Normal => self.line.chars().count(),
            InputMode::Password { .. } => self.secure.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// What is painted after the prompt.
    #[must_use]
    pub fn visible_line(&self) -> String {
        match self.mode {
            InputMode::Normal => display_text(&self.line),
            InputMode::Password { mask } => self.secure.masked(mask),
        }
    }

    /// What is painted for the first `char_index` chars of the line.
    pub(super) fn visible_prefix(&self, char_index: usize) -> String {
        match self.mode {
            InputMode::Normal => {
                let end = byte_index(&self.line, char_index);
                display_text(&self.line[..end])
            }
            InputMode::Password { mask } => std::iter::repeat_n(mask, char_index).collect(),
        }
    }

    /// What is painted from `char_index` to the end of the line.
    pub(super) fn visible_suffix(&self, char_index: usize) -> String {
        let skip = match self.mode {
            InputMode::Normal => display_index(&self.line, char_index),
            InputMode::Password { .. } => char_index,
        };
        self.visible_line().chars().skip(skip).collect()
    }

    /// Where the command text starts.
    #[must_use]
    pub fn prompt_end(&self) -> TerminalPoint {
        next_position(
            &self.prompt_plain,
            self.anchor,
            self.width(),
            self.width_table.as_ref(),
        )
    }

    /// Where char `char_index` of the line is painted.
    #[must_use]
    pub fn point_at(&self, char_index: usize) -> TerminalPoint {
        next_position(
            &self.visible_prefix(char_index),
            self.prompt_end(),
            self.width(),
            self.width_table.as_ref(),
        )
    }

    #[must_use]
    pub fn cursor_point(&self) -> TerminalPoint { self.point_at(self.cursor) }

    #[must_use]
    pub fn end_point(&self) -> TerminalPoint { self.point_at(self.len()) }

    /// Whether the terminal cursor is parked past the right edge after painting
    /// everything: the text ended exactly at the edge, so [`Self::end_point`] is the first
    /// cell of the next row but the terminal has not moved there yet.
    pub(super) fn ends_in_pending_wrap(&self) -> bool {
        if self.end_point().col != 0 {
            return false;
        }
        let last = self
            .visible_line()
            .chars()
            .last()
            .or_else(|| self.prompt_plain.chars().last());
        last.is_some_and(|ch| !matches!(ch, '\n' | '\r'))
    }

    /// Drops the line being edited. The password buffer is wiped.
    pub(super) fn reset_line(&mut self) {
        self.line.clear();
        self.secure = SecureBuffer::new();
        self.cursor = 0;
        self.completion = None;
    }
}

/// Byte offset of char `char_index`, clamped to the end of `text`.
pub(super) fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(index, _)| index)
}
