// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! CSI sequences that make up the wire contract between the line editor and the terminal
//! emulator. Everything the editor paints goes through [`CsiSequence`], so the exact bytes
//! are produced in one place.

use std::fmt::{Display, Formatter, Result};

/// Control Sequence Introducer: `ESC [`.
pub const CSI_START: &str = "\x1b[";
pub const CSI_PARAM_SEPARATOR: char = ';';
pub const CSI_PRIVATE_MODE_PREFIX: char = '?';

/// Horizontal and Vertical Position - ESC [ row ; col f
pub const HVP_CURSOR_POSITION: char = 'f';
/// Cursor Position (home when no params) - ESC [ H
pub const CUP_CURSOR_POSITION: char = 'H';
/// Erase Display - ESC [ n J
pub const ED_ERASE_DISPLAY: char = 'J';
pub const ED_ERASE_TO_END: u16 = 0;
pub const ED_ERASE_ALL: u16 = 2;
/// Set Mode (private) - ESC [ ? n h
pub const SM_SET_PRIVATE_MODE: char = 'h';
/// Reset Mode (private) - ESC [ ? n l
pub const RM_RESET_PRIVATE_MODE: char = 'l';
/// Text cursor enable mode.
pub const DECTCEM_SHOW_CURSOR: u16 = 25;
/// Select Graphic Rendition - ESC [ n ; ... m
pub const SGR_SET_GRAPHICS: char = 'm';
pub const SGR_RESET: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseDisplayMode {
    /// ED 0, from the cursor to the end of the screen.
    FromCursorToEnd,
    /// ED 2, the whole screen.
    EntireScreen,
}

impl EraseDisplayMode {
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            EraseDisplayMode::FromCursorToEnd => ED_ERASE_TO_END,
            EraseDisplayMode::EntireScreen => ED_ERASE_ALL,
        }
    }
}

/// Builder for the CSI sequences the editor emits. Rows and columns are 1-based, as
/// they appear on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsiSequence {
    /// ESC [ row ; col f
    CursorPositionAlt { row: u16, col: u16 },
    /// ESC [ H
    CursorHome,
    /// ESC [ n J
    EraseDisplay(EraseDisplayMode),
    /// ESC [ ? 25 h
    ShowCursor,
    /// ESC [ ? 25 l
    HideCursor,
    /// ESC [ n ; ... m
    Sgr(Vec<u8>),
}

impl Display for CsiSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(CSI_START)?;
        match self {
            CsiSequence::CursorPositionAlt { row, col } => {
                write!(f, "{row}{CSI_PARAM_SEPARATOR}{col}{HVP_CURSOR_POSITION}")
            }
            CsiSequence::CursorHome => write!(f, "{CUP_CURSOR_POSITION}"),
            CsiSequence::EraseDisplay(mode) => {
                write!(f, "{}{ED_ERASE_DISPLAY}", mode.as_u16())
            }
            CsiSequence::ShowCursor => write!(
                f,
                "{CSI_PRIVATE_MODE_PREFIX}{DECTCEM_SHOW_CURSOR}{SM_SET_PRIVATE_MODE}"
            ),
            CsiSequence::HideCursor => write!(
                f,
                "{CSI_PRIVATE_MODE_PREFIX}{DECTCEM_SHOW_CURSOR}{RM_RESET_PRIVATE_MODE}"
            ),
            CsiSequence::Sgr(params) => {
                for (index, param) in params.iter().enumerate() {
                    if index > 0 {
                        write!(f, "{CSI_PARAM_SEPARATOR}")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, "{SGR_SET_GRAPHICS}")
            }
        }
    }
}
