// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::core::LineState;
use crate::{Patch, RenderOp, TerminalPoint};

/// Where a repaint starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaintFrom {
    /// The prompt and the whole line.
    Prompt,
    /// Char index into the line. Everything before it is already on screen.
    Char(usize),
}

impl LineState {
    /// Erase from `from` to the end of the screen, rewrite what follows, and put the
    /// cursor back. When the text now runs past the bottom row the terminal scrolls, and
    /// [`Self::anchor`] moves up by as many rows.
    pub fn repaint(&mut self, from: RepaintFrom) -> Patch {
        let (start, text) = match from {
            RepaintFrom::Prompt => (
                self.anchor,
                format!("{}{}", self.prompt, self.visible_line()),
            ),
            RepaintFrom::Char(char_index) => {
                (self.point_at(char_index), self.visible_suffix(char_index))
            }
        };

        let mut patch = Patch::from(vec![
            RenderOp::HideCursor,
            RenderOp::MoveTo(start),
            RenderOp::EraseToEndOfScreen,
        ]);
        let painted_something = !text.is_empty();
        if painted_something {
            patch.push(RenderOp::Print(text));
            if matches!(from, RepaintFrom::Prompt) {
                patch.push(RenderOp::reset_attributes());
            }
            if self.ends_in_pending_wrap() {
                patch.push(RenderOp::Print("\n".into()));
            }
        }
        self.scroll_to_fit(self.end_point());
        patch.push(RenderOp::MoveTo(self.cursor_point()));
        patch.push(RenderOp::ShowCursor);
        patch
    }

    /// Move the cursor without repainting anything.
    pub(super) fn move_cursor_to(&mut self, char_index: usize) -> Patch {
        let char_index = char_index.min(self.len());
        if char_index == self.cursor {
            return Patch::new();
        }
        self.cursor = char_index;
        Patch::from(vec![RenderOp::MoveTo(self.cursor_point())])
    }

    /// Erase the prompt and the line from the screen, leaving the cursor at the anchor.
    #[must_use]
    pub fn erase(&self) -> Patch {
        Patch::from(vec![
            RenderOp::MoveTo(self.anchor),
            RenderOp::EraseToEndOfScreen,
        ])
    }

    /// A terminal never leaves its cursor below the last row. If `bottom` is past it, the
    /// screen has scrolled.
    pub(super) fn scroll_to_fit(&mut self, bottom: TerminalPoint) {
        let last_row = i32::from(self.height()) - 1;
        if bottom.row > last_row {
            self.anchor.row -= bottom.row - last_row;
        }
    }

    /// Keep the anchor on screen when it is given a point that may be past the bottom.
    pub(super) fn set_anchor_clamped(&mut self, point: TerminalPoint) {
        let last_row = i32::from(self.height()) - 1;
        self.anchor = TerminalPoint::new(point.col.max(0), point.row.clamp(0, last_row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OutputDeviceExt, OutputDevice, lock_output_device_as_mut};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repaint_from_prompt_writes_prompt_and_line() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.line = "abc".into();
        line_state.cursor = 1;

        let patch = line_state.repaint(RepaintFrom::Prompt);

        assert_eq!(
            patch.to_ansi_string(),
            "\x1b[?25l\x1b[1;1f\x1b[0J$ abc\x1b[0m\x1b[1;4f\x1b[?25h"
        );
    }

    #[test]
    fn test_repaint_from_char_only_rewrites_the_tail() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.anchor = TerminalPoint::new(0, 5);
        line_state.line = "hello".into();
        line_state.cursor = 5;

        let patch = line_state.repaint(RepaintFrom::Char(3));

        assert_eq!(
            patch.ops,
            vec![
                RenderOp::HideCursor,
                RenderOp::MoveTo(TerminalPoint::new(5, 5)),
                RenderOp::EraseToEndOfScreen,
                RenderOp::Print("lo".into()),
                RenderOp::MoveTo(TerminalPoint::new(7, 5)),
                RenderOp::ShowCursor,
            ]
        );
    }

    #[test]
    fn test_repaint_scrolls_anchor_when_past_bottom() {
        let mut line_state = LineState::new("$ ".into(), (10, 3));
        line_state.anchor = TerminalPoint::new(0, 2);
        line_state.line = "0123456789abc".into();
        line_state.cursor = 13;

        // 15 cells in a 10 wide buffer: one more row than the screen has left.
        let patch = line_state.repaint(RepaintFrom::Prompt);

        assert_eq!(line_state.anchor, TerminalPoint::new(0, 1));
        assert_eq!(line_state.end_point(), TerminalPoint::new(5, 2));
        assert_eq!(
            patch.ops.last(),
            Some(&RenderOp::ShowCursor),
        );
    }

    #[test]
    fn test_repaint_pending_wrap_moves_to_next_row() {
        let mut line_state = LineState::new("$ ".into(), (4, 24));
        line_state.line = "ab".into();
        line_state.cursor = 2;

        let patch = line_state.repaint(RepaintFrom::Char(0));

        assert!(patch.ops.contains(&RenderOp::Print("\n".into())));
        assert_eq!(line_state.cursor_point(), TerminalPoint::new(0, 1));
    }

    #[test]
    fn test_flush_repaint_to_output_device() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let mut line_state = LineState::new("> ".into(), (80, 24));
        line_state.line = "ls".into();
        line_state.cursor = 2;

        let patch = line_state.repaint(RepaintFrom::Prompt);
        patch
            .flush(lock_output_device_as_mut!(output_device))
            .unwrap();

        assert_eq!(stdout_mock.get_copy_of_buffer_as_string_strip_ansi(), "> ls");
    }
}
