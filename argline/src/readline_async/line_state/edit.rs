// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{core::{InputMode, LineState, byte_index},
            render::RepaintFrom};
use crate::{CompletionCycle, CompletionDirection, CompletionSource, History, Patch,
            ReadlineError, RenderOp, TerminalPoint, TokenizerOptions, prev_position,
            tokenize_partial};
use unicode_segmentation::UnicodeSegmentation;

/// One change to the line being edited. See [`LineState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    InsertText(String),
    Backspace,
    Delete,
    MoveLeft,
    MoveRight,
    MoveWordLeft,
    MoveWordRight,
    MoveHome,
    MoveEnd,
    DeleteToStart,
    DeleteWordBefore,
    HistoryPrev,
    HistoryNext,
    CompletionNext,
    CompletionPrev,
    /// `cursor` is where the terminal says the cursor is after the resize, if known.
    Resize {
        width: u16,
        height: u16,
        cursor: Option<TerminalPoint>,
    },
    SetPrompt(String),
    ClearScreen,
}

/// What an edit may need besides the line itself.
#[allow(missing_debug_implementations)]
pub struct EditContext<'a> {
    pub history: &'a mut History,
    pub completion_source: Option<&'a dyn CompletionSource>,
    pub tokenizer_options: TokenizerOptions,
}

impl<'a> EditContext<'a> {
    #[must_use]
    pub fn new(history: &'a mut History) -> Self {
        Self {
            history,
            completion_source: None,
            tokenizer_options: TokenizerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_completion_source(mut self, source: &'a dyn CompletionSource) -> Self {
        self.completion_source = Some(source);
        self
    }

    #[must_use]
    pub fn with_tokenizer_options(mut self, options: TokenizerOptions) -> Self {
        self.tokenizer_options = options;
        self
    }
}

impl LineState {
    /// Apply `edit` and return what has to be written to the terminal to show it. Nothing
    /// is written here; see [`crate::Patch::flush`].
    ///
    /// Only the region from the first changed char to the end of the line is repainted.
    /// Any edit other than completion ends the current completion cycle.
    ///
    /// # Errors
    ///
    /// [`ReadlineError::InvalidOperation`] for history or completion in
    /// [`InputMode::Password`]. The line is left as it was.
    pub fn apply(
        &mut self,
        edit: Edit,
        ctx: &mut EditContext<'_>,
    ) -> Result<Patch, ReadlineError> {
        if !matches!(edit, Edit::CompletionNext | Edit::CompletionPrev) {
            self.completion = None;
        }

        let patch = match edit {
            Edit::InsertText(text) => self.insert_text(&text)?,
            Edit::Backspace => {
                if self.cursor == 0 {
                    return Ok(Patch::new());
                }
                self.remove_chars(self.grapheme_start_before_cursor(), self.cursor)?
            }
            Edit::Delete => {
                if self.cursor >= self.len() {
                    return Ok(Patch::new());
                }
                self.remove_chars(self.cursor, self.grapheme_end_after_cursor())?
            }
            Edit::MoveLeft => self.move_cursor_to(self.grapheme_start_before_cursor()),
            Edit::MoveRight => self.move_cursor_to(self.grapheme_end_after_cursor()),
            Edit::MoveWordLeft => self.move_cursor_to(self.word_start_before_cursor()),
            Edit::MoveWordRight => self.move_cursor_to(self.word_end_after_cursor()),
            Edit::MoveHome => self.move_cursor_to(0),
            Edit::MoveEnd => self.move_cursor_to(self.len()),
            Edit::DeleteToStart => self.remove_chars(0, self.cursor)?,
            Edit::DeleteWordBefore => {
                self.remove_chars(self.word_start_before_cursor(), self.cursor)?
            }
            Edit::HistoryPrev => {
                self.check_not_password("history is not available while reading a password")?;
                match ctx.history.previous_entry(&self.line) {
                    Some(entry) => {
                        let entry = entry.to_string();
                        self.replace_line(entry)
                    }
                    None => Patch::new(),
                }
            }
            Edit::HistoryNext => {
                self.check_not_password("history is not available while reading a password")?;
                match ctx.history.next_entry() {
                    Some(entry) => self.replace_line(entry),
                    None => Patch::new(),
                }
            }
            Edit::CompletionNext => self.complete(CompletionDirection::Next, ctx)?,
            Edit::CompletionPrev => self.complete(CompletionDirection::Prev, ctx)?,
            Edit::Resize {
                width,
                height,
                cursor,
            } => self.resize(width, height, cursor),
            Edit::SetPrompt(prompt) => {
                self.set_prompt_text(&prompt);
                self.repaint(RepaintFrom::Prompt)
            }
            Edit::ClearScreen => {
                self.anchor = TerminalPoint::default();
                self.last_line_completed = true;
                self.last_line_col = 0;
                let mut patch = Patch::from(vec![RenderOp::ClearScreen, RenderOp::MoveHome]);
                patch.append(self.repaint(RepaintFrom::Prompt));
                patch
            }
        };
        Ok(patch)
    }

    fn check_not_password(&self, message: &'static str) -> Result<(), ReadlineError> {
        if self.is_password_mode() {
            return Err(ReadlineError::InvalidOperation(message));
        }
        Ok(())
    }

    fn insert_text(&mut self, text: &str) -> Result<Patch, ReadlineError> {
        let from = self.cursor;
        match self.mode {
            InputMode::Normal => {
                let text: String = text.chars().filter(|ch| is_insertable(*ch)).collect();
                let at = byte_index(&self.line, from);
                self.line.insert_str(at, &text);
                self.cursor += text.chars().count();
            }
            InputMode::Password { .. } => {
                let text: String = text
                    .chars()
                    .filter(|ch| *ch != '\n' && is_insertable(*ch))
                    .collect();
                self.secure.insert_str(from, &text)?;
                self.cursor += text.chars().count();
            }
        }
        if self.cursor == from {
            return Ok(Patch::new());
        }
        Ok(self.repaint(RepaintFrom::Char(from)))
    }

    /// Removes the chars in `start..end` and leaves the cursor at `start`.
    fn remove_chars(&mut self, start: usize, end: usize) -> Result<Patch, ReadlineError> {
        if start >= end {
            return Ok(Patch::new());
        }
        match self.mode {
            InputMode::Normal => {
                let range = byte_index(&self.line, start)..byte_index(&self.line, end);
                self.line.replace_range(range, "");
            }
            InputMode::Password { .. } => self.secure.remove_range(start..end)?,
        }
        self.cursor = start;
        Ok(self.repaint(RepaintFrom::Char(start)))
    }

    /// The whole line is swapped out, cursor at the end.
    fn replace_line(&mut self, line: String) -> Patch {
        self.line = line;
        self.cursor = self.len();
        self.repaint(RepaintFrom::Char(0))
    }

    /// Start of the grapheme cluster before the cursor. Password mode steps by char.
    fn grapheme_start_before_cursor(&self) -> usize {
        if self.cursor == 0 {
            return 0;
        }
        if self.is_password_mode() {
            return self.cursor - 1;
        }
        let before = &self.line[..byte_index(&self.line, self.cursor)];
        before
            .graphemes(true)
            .next_back()
            .map_or(self.cursor - 1, |it| self.cursor - it.chars().count())
    }

    /// End of the grapheme cluster after the cursor. Password mode steps by char.
    fn grapheme_end_after_cursor(&self) -> usize {
        let len = self.len();
        if self.cursor >= len {
            return len;
        }
        if self.is_password_mode() {
            return self.cursor + 1;
        }
        let after = &self.line[byte_index(&self.line, self.cursor)..];
        after
            .graphemes(true)
            .next()
            .map_or(self.cursor + 1, |it| self.cursor + it.chars().count())
    }

    /// Start of the word before the cursor, skipping whitespace first. A password has no
    /// words, so this is the start of the line.
    fn word_start_before_cursor(&self) -> usize {
        if self.is_password_mode() {
            return 0;
        }
        let chars: Vec<char> = self.line.chars().take(self.cursor).collect();
        let mut index = chars.len();
        while index > 0 && chars[index - 1].is_whitespace() {
            index -= 1;
        }
        while index > 0 && !chars[index - 1].is_whitespace() {
            index -= 1;
        }
        index
    }

    /// End of the word after the cursor, skipping whitespace first.
    fn word_end_after_cursor(&self) -> usize {
        if self.is_password_mode() {
            return self.len();
        }
        let rest: Vec<char> = self.line.chars().skip(self.cursor).collect();
        let mut index = 0;
        while index < rest.len() && rest[index].is_whitespace() {
            index += 1;
        }
        while index < rest.len() && !rest[index].is_whitespace() {
            index += 1;
        }
        self.cursor + index
    }

    /// Starts a cycle from the text before the cursor on the first press, then steps
    /// through it. The fragment being completed is replaced with the candidate.
    fn complete(
        &mut self,
        direction: CompletionDirection,
        ctx: &EditContext<'_>,
    ) -> Result<Patch, ReadlineError> {
        self.check_not_password("completion is not available while reading a password")?;

        if self.completion.is_none() {
            let Some(source) = ctx.completion_source else {
                return Ok(Patch::new());
            };
            let prefix = &self.line[..byte_index(&self.line, self.cursor)];
            let Ok(partial) = tokenize_partial(prefix, &ctx.tokenizer_options) else {
                return Ok(Patch::new());
            };
            let Some(candidates) =
                source.get_completions(&partial.complete, &partial.fragment.text)
            else {
                return Ok(Patch::new());
            };
            tracing::debug!(
                message = "completion candidates",
                fragment = ?partial.fragment.text,
                count = candidates.len()
            );
            self.completion =
                CompletionCycle::new(candidates, partial.fragment.start, partial.fragment.quote);
        }

        let Some(cycle) = self.completion.as_mut() else {
            return Ok(Patch::new());
        };
        let replacement = cycle.step(direction);
        let start = cycle.fragment_start;

        let range = byte_index(&self.line, start)..byte_index(&self.line, self.cursor);
        self.line.replace_range(range, &replacement);
        self.cursor = start + replacement.chars().count();
        Ok(self.repaint(RepaintFrom::Char(start)))
    }

    /// The terminal reflows on its own, so the anchor is worked out backwards from where
    /// the cursor ends up, and everything is painted again.
    fn resize(&mut self, width: u16, height: u16, cursor: Option<TerminalPoint>) -> Patch {
        let cursor_point = cursor.unwrap_or_else(|| self.cursor_point());
        self.term_size = (width.max(1), height.max(1));
        let last_row = i32::from(self.height()) - 1;
        let cursor_point = TerminalPoint::new(
            cursor_point.col.min(i32::from(self.width()) - 1),
            cursor_point.row.min(last_row),
        );

        let painted_before_cursor =
            format!("{}{}", self.prompt_plain, self.visible_prefix(self.cursor));
        self.anchor = prev_position(
            &painted_before_cursor,
            self.width(),
            cursor_point,
            self.width_table.as_ref(),
        );
        if self.anchor.row < 0 {
            self.anchor.row = 0;
        }
        self.repaint(RepaintFrom::Prompt)
    }
}

/// Control chars never make it into the line, except for the line feed of a multiline
/// command.
fn is_insertable(ch: char) -> bool { ch == '\n' || !ch.is_control() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Descriptor, DescriptorSet, ValueType};
    use pretty_assertions::assert_eq;

    fn apply_all(line_state: &mut LineState, history: &mut History, edits: Vec<Edit>) {
        let mut ctx = EditContext::new(history);
        for edit in edits {
            line_state.apply(edit, &mut ctx).unwrap();
        }
    }

    fn type_text(text: &str) -> Vec<Edit> {
        text.chars().map(|ch| Edit::InsertText(ch.to_string())).collect()
    }

    #[tokio::test]
    async fn test_insert_repaints_from_insertion_point_only() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        apply_all(&mut line_state, &mut history, type_text("helo"));
        apply_all(&mut line_state, &mut history, vec![Edit::MoveLeft]);

        let mut ctx = EditContext::new(&mut history);
        let patch = line_state
            .apply(Edit::InsertText("l".into()), &mut ctx)
            .unwrap();

        assert_eq!(line_state.line, "hello");
        assert_eq!(line_state.cursor, 4);
        assert_eq!(
            patch.ops,
            vec![
                RenderOp::HideCursor,
                RenderOp::MoveTo(TerminalPoint::new(5, 0)),
                RenderOp::EraseToEndOfScreen,
                RenderOp::Print("lo".into()),
                RenderOp::MoveTo(TerminalPoint::new(6, 0)),
                RenderOp::ShowCursor,
            ]
        );
    }

    #[tokio::test]
    async fn test_cursor_steps_over_whole_grapheme_clusters() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);

        // `e` followed by a combining acute accent is one cluster of two chars.
        line_state
            .apply(Edit::InsertText("ae\u{301}z".into()), &mut ctx)
            .unwrap();
        assert_eq!(line_state.cursor, 4);

        line_state.apply(Edit::MoveLeft, &mut ctx).unwrap();
        line_state.apply(Edit::MoveLeft, &mut ctx).unwrap();
        assert_eq!(line_state.cursor, 1);

        line_state.apply(Edit::MoveRight, &mut ctx).unwrap();
        assert_eq!(line_state.cursor, 3);

        line_state.apply(Edit::Backspace, &mut ctx).unwrap();
        assert_eq!(line_state.line, "az");
        assert_eq!(line_state.cursor, 1);
    }

    #[tokio::test]
    async fn test_backspace_and_delete_are_noops_at_the_edges() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);

        assert!(line_state.apply(Edit::Backspace, &mut ctx).unwrap().is_empty());
        line_state.apply(Edit::InsertText("ab".into()), &mut ctx).unwrap();
        assert!(line_state.apply(Edit::Delete, &mut ctx).unwrap().is_empty());

        line_state.apply(Edit::Backspace, &mut ctx).unwrap();
        assert_eq!(line_state.line, "a");
        line_state.apply(Edit::MoveHome, &mut ctx).unwrap();
        line_state.apply(Edit::Delete, &mut ctx).unwrap();
        assert_eq!(line_state.line, "");
        assert_eq!(line_state.cursor, 0);
    }

    #[tokio::test]
    async fn test_word_moves_and_deletes() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);
        line_state
            .apply(Edit::InsertText("git  commit -m".into()), &mut ctx)
            .unwrap();

        line_state.apply(Edit::MoveWordLeft, &mut ctx).unwrap();
        assert_eq!(line_state.cursor, 12);
        line_state.apply(Edit::MoveWordLeft, &mut ctx).unwrap();
        assert_eq!(line_state.cursor, 5);
        line_state.apply(Edit::MoveWordRight, &mut ctx).unwrap();
        assert_eq!(line_state.cursor, 11);

        line_state.apply(Edit::DeleteWordBefore, &mut ctx).unwrap();
        assert_eq!(line_state.line, "git   -m");
        assert_eq!(line_state.cursor, 5);

        line_state.apply(Edit::DeleteToStart, &mut ctx).unwrap();
        assert_eq!(line_state.line, " -m");
        assert_eq!(line_state.cursor, 0);
    }

    #[tokio::test]
    async fn test_history_navigation_replaces_line_and_restores_draft() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        history.record("first");
        history.record("second");
        let mut ctx = EditContext::new(&mut history);
        line_state.apply(Edit::InsertText("dra".into()), &mut ctx).unwrap();

        line_state.apply(Edit::HistoryPrev, &mut ctx).unwrap();
        assert_eq!(line_state.line, "second");
        assert_eq!(line_state.cursor, 6);
        line_state.apply(Edit::HistoryPrev, &mut ctx).unwrap();
        assert_eq!(line_state.line, "first");
        assert!(line_state.apply(Edit::HistoryPrev, &mut ctx).unwrap().is_empty());

        line_state.apply(Edit::HistoryNext, &mut ctx).unwrap();
        line_state.apply(Edit::HistoryNext, &mut ctx).unwrap();
        assert_eq!(line_state.line, "dra");
    }

    #[tokio::test]
    async fn test_completion_cycles_and_keeps_quotes() {
        let set = DescriptorSet::new(vec![
            Descriptor::optional("profile")
                .short('p')
                .value_type(ValueType::Choice(vec![
                    "release".into(),
                    "debug".into(),
                    "dev build".into(),
                ])),
        ])
        .unwrap();
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history).with_completion_source(&set);
        line_state.apply(Edit::InsertText("-p d".into()), &mut ctx).unwrap();

        line_state.apply(Edit::CompletionNext, &mut ctx).unwrap();
        assert_eq!(line_state.line, "-p debug");
        line_state.apply(Edit::CompletionNext, &mut ctx).unwrap();
        assert_eq!(line_state.line, "-p 'dev build'");
        line_state.apply(Edit::CompletionNext, &mut ctx).unwrap();
        assert_eq!(line_state.line, "-p debug");
        line_state.apply(Edit::CompletionPrev, &mut ctx).unwrap();
        assert_eq!(line_state.line, "-p 'dev build'");
        assert_eq!(line_state.cursor, line_state.len());

        // Any other edit ends the cycle.
        line_state.apply(Edit::MoveLeft, &mut ctx).unwrap();
        assert!(line_state.completion().is_none());
    }

    #[tokio::test]
    async fn test_completion_reuses_the_opening_quote() {
        let source = |_: &[String], fragment: &str| {
            Some(
                ["alpha beta", "alpine"]
                    .iter()
                    .filter(|it| it.starts_with(fragment))
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            )
        };
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history).with_completion_source(&source);
        line_state.apply(Edit::InsertText("open 'al".into()), &mut ctx).unwrap();

        line_state.apply(Edit::CompletionNext, &mut ctx).unwrap();
        assert_eq!(line_state.line, "open 'alpha beta'");
        line_state.apply(Edit::CompletionNext, &mut ctx).unwrap();
        assert_eq!(line_state.line, "open 'alpine'");
    }

    #[tokio::test]
    async fn test_completion_without_source_or_candidates_is_a_noop() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);
        line_state.apply(Edit::InsertText("x".into()), &mut ctx).unwrap();
        assert!(line_state.apply(Edit::CompletionNext, &mut ctx).unwrap().is_empty());

        let nothing = |_: &[String], _: &str| Some(Vec::<String>::new());
        let mut ctx = EditContext::new(&mut history).with_completion_source(&nothing);
        assert!(line_state.apply(Edit::CompletionNext, &mut ctx).unwrap().is_empty());
        assert_eq!(line_state.line, "x");
    }

    #[tokio::test]
    async fn test_password_mode_masks_and_rejects_history_and_completion() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        history.record("secret history");
        line_state.begin_password("Password: ", '*');
        let source = |_: &[String], _: &str| Some(vec!["x".to_string()]);
        let mut ctx = EditContext::new(&mut history).with_completion_source(&source);

        for (count, ch) in "hunter2".chars().enumerate() {
            let patch = line_state
                .apply(Edit::InsertText(ch.to_string()), &mut ctx)
                .unwrap();
            for op in &patch.ops {
                if let RenderOp::Print(text) = op {
                    assert!(!text.contains(ch));
                }
            }
            assert_eq!(line_state.visible_line(), "*".repeat(count + 1));
        }
        assert_eq!(line_state.secure.as_unsecure_str(), "hunter2");
        assert!(line_state.line.is_empty());

        assert!(matches!(
            line_state.apply(Edit::HistoryPrev, &mut ctx),
            Err(ReadlineError::InvalidOperation(_))
        ));
        assert!(matches!(
            line_state.apply(Edit::CompletionNext, &mut ctx),
            Err(ReadlineError::InvalidOperation(_))
        ));
        // Still editable afterwards.
        line_state.apply(Edit::Backspace, &mut ctx).unwrap();
        assert_eq!(line_state.visible_line(), "******");
    }

    #[tokio::test]
    async fn test_resize_recomputes_anchor_from_cursor() {
        let mut line_state = LineState::new("$ ".into(), (20, 10));
        line_state.anchor = TerminalPoint::new(0, 4);
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);
        line_state
            .apply(Edit::InsertText("0123456789abcdef".into()), &mut ctx)
            .unwrap();
        assert_eq!(line_state.cursor_point(), TerminalPoint::new(18, 4));

        // Narrower: the 18 cells before the cursor now take two rows.
        line_state
            .apply(
                Edit::Resize {
                    width: 10,
                    height: 10,
                    cursor: Some(TerminalPoint::new(8, 6)),
                },
                &mut ctx,
            )
            .unwrap();
        assert_eq!(line_state.anchor, TerminalPoint::new(0, 5));
        assert_eq!(line_state.cursor_point(), TerminalPoint::new(8, 6));
    }

    #[tokio::test]
    async fn test_clear_screen_moves_anchor_home() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.anchor = TerminalPoint::new(0, 12);
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);

        let patch = line_state.apply(Edit::ClearScreen, &mut ctx).unwrap();

        assert_eq!(line_state.anchor, TerminalPoint::default());
        assert_eq!(patch.ops[0], RenderOp::ClearScreen);
        assert_eq!(patch.ops[1], RenderOp::MoveHome);
    }

    #[tokio::test]
    async fn test_print_after_clear_screen_starts_at_the_top() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.anchor = TerminalPoint::new(0, 12);
        line_state.print_data(b"loading");
        assert!(!line_state.last_line_completed);

        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);
        line_state.apply(Edit::ClearScreen, &mut ctx).unwrap();
        assert!(line_state.last_line_completed);
        assert_eq!(line_state.last_line_col, 0);

        let patch = line_state.print_data(b"done\n");
        assert!(
            !patch
                .ops
                .iter()
                .any(|op| matches!(op, RenderOp::MoveTo(point) if point.row < 0))
        );
        assert_eq!(line_state.anchor, TerminalPoint::new(0, 1));
    }

    #[tokio::test]
    async fn test_set_prompt_repaints_everything() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);
        line_state.apply(Edit::InsertText("ls".into()), &mut ctx).unwrap();

        let patch = line_state
            .apply(Edit::SetPrompt("\x1b[32m>>> \x1b[0m".into()), &mut ctx)
            .unwrap();

        assert_eq!(line_state.prompt_end(), TerminalPoint::new(4, 0));
        assert_eq!(line_state.cursor_point(), TerminalPoint::new(6, 0));
        assert!(patch.to_ansi_string().contains(">>> \x1b[0mls"));
    }
}
