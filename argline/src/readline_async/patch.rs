// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CsiSequence, EraseDisplayMode, SGR_RESET, TerminalPoint};
use std::io::{self, Write};

/// One step of a repaint. Serializes to the CSI sequences in [`crate::ansi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOp {
    HideCursor,
    ShowCursor,
    /// 0-based, clamped to the top left cell on the wire.
    MoveTo(TerminalPoint),
    EraseToEndOfScreen,
    ClearScreen,
    MoveHome,
    /// `\n` goes out as `\r\n`, since raw mode does not return the carriage.
    Print(String),
    Sgr(Vec<u8>),
}

impl RenderOp {
    #[must_use]
    pub fn reset_attributes() -> Self { RenderOp::Sgr(vec![SGR_RESET]) }

    pub fn write_to(&self, acc: &mut String) {
        let sequence = match self {
            RenderOp::HideCursor => CsiSequence::HideCursor,
            RenderOp::ShowCursor => CsiSequence::ShowCursor,
            RenderOp::MoveTo(point) => CsiSequence::CursorPositionAlt {
                row: to_wire(point.row),
                col: to_wire(point.col),
            },
            RenderOp::EraseToEndOfScreen => {
                CsiSequence::EraseDisplay(EraseDisplayMode::FromCursorToEnd)
            }
            RenderOp::ClearScreen => CsiSequence::EraseDisplay(EraseDisplayMode::EntireScreen),
            RenderOp::MoveHome => CsiSequence::CursorHome,
            RenderOp::Sgr(params) => CsiSequence::Sgr(params.clone()),
            RenderOp::Print(text) => {
                acc.push_str(&text.replace('\n', "\r\n"));
                return;
            }
        };
        acc.push_str(&sequence.to_string());
    }
}

/// 0-based cell coordinate to a 1-based wire coordinate.
fn to_wire(it: i32) -> u16 {
    let one_based = it.saturating_add(1);
    u16::try_from(one_based)
        .unwrap_or(if one_based < 1 { 1 } else { u16::MAX })
        .max(1)
}

/// Output of one [`crate::LineState::apply`]. Computing it does no I/O, and
/// [`Patch::flush`] is the only step that writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Patch {
    pub ops: Vec<RenderOp>,
}

impl Patch {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, op: RenderOp) { self.ops.push(op); }

    pub fn append(&mut self, other: Patch) { self.ops.extend(other.ops); }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    #[must_use]
    pub fn to_ansi_string(&self) -> String {
        let mut acc = String::new();
        for op in &self.ops {
            op.write_to(&mut acc);
        }
        acc
    }

    /// # Errors
    ///
    /// Returns an error if writing to `term` fails.
    pub fn flush(&self, term: &mut dyn Write) -> io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        term.write_all(self.to_ansi_string().as_bytes())?;
        term.flush()
    }
}

impl From<Vec<RenderOp>> for Patch {
    fn from(ops: Vec<RenderOp>) -> Self { Self { ops } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StdoutMock;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_format() {
        let patch = Patch::from(vec![
            RenderOp::HideCursor,
            RenderOp::MoveTo(TerminalPoint::new(4, 2)),
            RenderOp::EraseToEndOfScreen,
            RenderOp::Print("a\nb".into()),
            RenderOp::reset_attributes(),
            RenderOp::ShowCursor,
        ]);
        assert_eq!(
            patch.to_ansi_string(),
            "\x1b[?25l\x1b[3;5f\x1b[0Ja\r\nb\x1b[0m\x1b[?25h"
        );
    }

    #[test]
    fn test_move_to_clamps_offscreen_rows() {
        let patch = Patch::from(vec![RenderOp::MoveTo(TerminalPoint::new(0, -3))]);
        assert_eq!(patch.to_ansi_string(), "\x1b[1;1f");
    }

    #[test]
    fn test_flush_writes_everything() {
        let mut stdout_mock = StdoutMock::default();
        Patch::from(vec![RenderOp::ClearScreen, RenderOp::MoveHome])
            .flush(&mut stdout_mock)
            .unwrap();
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "\x1b[2J\x1b[H");
    }
}
