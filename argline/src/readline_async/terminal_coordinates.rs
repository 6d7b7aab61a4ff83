// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Pure geometry over a width table: where does text that starts at some cell end up
//! once it wraps at the buffer width, and the inverse. Nothing here touches a terminal.

use std::{cmp::Ordering,
          fmt::Debug,
          ops::{Add, Sub}};
use unicode_width::UnicodeWidthChar;

pub const CARRIAGE_RETURN: char = '\r';
pub const LINE_FEED: char = '\n';

/// Shown at the start of every continuation row of a multiline command.
pub const CONTINUATION_MARKER: &str = "> ";

/// A cell in the terminal grid, 0-based. `row` can go negative once the start of the
/// prompt scrolls off the top of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TerminalPoint {
    pub col: i32,
    pub row: i32,
}

impl TerminalPoint {
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self { Self { col, row } }

    /// Position in a row major walk of a grid `width` cells wide.
    #[must_use]
    pub fn linear(&self, width: u16) -> i64 {
        i64::from(self.row) * i64::from(width) + i64::from(self.col)
    }
}

/// Row major.
impl Ord for TerminalPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.row, self.col).cmp(&(other.row, other.col))
    }
}

impl PartialOrd for TerminalPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TerminalVector {
    pub cols: i32,
    pub rows: i32,
}

impl Add<TerminalVector> for TerminalPoint {
    type Output = TerminalPoint;

    fn add(self, rhs: TerminalVector) -> Self::Output {
        TerminalPoint::new(self.col + rhs.cols, self.row + rhs.rows)
    }
}

impl Sub<TerminalVector> for TerminalPoint {
    type Output = TerminalPoint;

    fn sub(self, rhs: TerminalVector) -> Self::Output {
        TerminalPoint::new(self.col - rhs.cols, self.row - rhs.rows)
    }
}

impl Sub<TerminalPoint> for TerminalPoint {
    type Output = TerminalVector;

    fn sub(self, rhs: TerminalPoint) -> Self::Output {
        TerminalVector {
            cols: self.col - rhs.col,
            rows: self.row - rhs.row,
        }
    }
}

/// Display width of a char, in cells.
pub trait WidthTable: Debug {
    fn char_width(&self, ch: char) -> u16;

    fn text_width(&self, text: &str) -> usize {
        text.chars().map(|ch| usize::from(self.char_width(ch))).sum()
    }
}

/// Control chars have no width, everything else in ASCII is one cell.
const ASCII_WIDTHS: [u8; 128] = {
    let mut table = [1_u8; 128];
    let mut index = 0;
    while index < 0x20 {
        table[index] = 0;
        index += 1;
    }
    table[0x7F] = 0;
    table
};

/// Precomputed ASCII widths, [`unicode_width`] for everything else (so CJK and most
/// emoji are two cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnicodeWidthTable;

impl WidthTable for UnicodeWidthTable {
    fn char_width(&self, ch: char) -> u16 {
        match usize::try_from(u32::from(ch)) {
            Ok(code) if code < ASCII_WIDTHS.len() => u16::from(ASCII_WIDTHS[code]),
            _ => ch.width().map_or(0, |it| u16::try_from(it).unwrap_or(u16::MAX)),
        }
    }
}

/// Where the cursor lands after writing `text` at `start` in a buffer `width` cells
/// wide. `\r` goes to column 0, `\n` to column 0 of the next row, and a char that
/// reaches the right edge wraps with the remainder of its width.
#[must_use]
pub fn next_position(
    text: &str,
    start: TerminalPoint,
    width: u16,
    table: &dyn WidthTable,
) -> TerminalPoint {
    let width = i32::from(width.max(1));
    let mut point = start;
    for ch in text.chars() {
        match ch {
            CARRIAGE_RETURN => point.col = 0,
            LINE_FEED => {
                point.col = 0;
                point.row += 1;
            }
            _ => {
                point.col += i32::from(table.char_width(ch));
                while point.col >= width {
                    point.col -= width;
                    point.row += 1;
                }
            }
        }
    }
    point
}

/// Inverse of [`next_position`]: a start point from which writing `text` ends at
/// `end`. Only the text after the last line break pins down the column, so when `text`
/// has a break the start is taken to be at column 0.
#[must_use]
pub fn prev_position(
    text: &str,
    width: u16,
    end: TerminalPoint,
    table: &dyn WidthTable,
) -> TerminalPoint {
    let width = width.max(1);
    let wide = i64::from(width);

    let Some((break_index, break_char)) = text
        .char_indices()
        .rev()
        .find(|(_, ch)| matches!(*ch, CARRIAGE_RETURN | LINE_FEED))
    else {
        let start = end.linear(width) - text_width_i64(text, table);
        return point_from_linear(start, wide);
    };

    let head = &text[..break_index];
    let tail = &text[break_index + break_char.len_utf8()..];

    // Row right after the break, where the tail starts at column 0.
    let tail_start_row = (end.linear(width) - text_width_i64(tail, table)).div_euclid(wide);
    let break_row = match break_char {
        LINE_FEED => tail_start_row - 1,
        _ => tail_start_row,
    };
    let head_rows = i64::from(next_position(head, TerminalPoint::default(), width, table).row);

    TerminalPoint::new(0, saturate_i32(break_row - head_rows))
}

/// Command text as it is painted: [`CONTINUATION_MARKER`] after every `\n`.
#[must_use]
pub fn display_text(command: &str) -> String {
    command.replace(LINE_FEED, &format!("{LINE_FEED}{CONTINUATION_MARKER}"))
}

/// Maps a char index into `command` to the char index into [`display_text`].
#[must_use]
pub fn display_index(command: &str, char_index: usize) -> usize {
    let line_feeds = command
        .chars()
        .take(char_index)
        .filter(|ch| *ch == LINE_FEED)
        .count();
    char_index + line_feeds * CONTINUATION_MARKER.chars().count()
}

fn text_width_i64(text: &str, table: &dyn WidthTable) -> i64 {
    i64::try_from(table.text_width(text)).unwrap_or(i64::MAX)
}

fn point_from_linear(linear: i64, width: i64) -> TerminalPoint {
    TerminalPoint::new(
        saturate_i32(linear.rem_euclid(width)),
        saturate_i32(linear.div_euclid(width)),
    )
}

fn saturate_i32(it: i64) -> i32 {
    i32::try_from(it).unwrap_or(if it < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const TABLE: UnicodeWidthTable = UnicodeWidthTable;

    fn point(col: i32, row: i32) -> TerminalPoint { TerminalPoint::new(col, row) }

    #[test]
    fn test_ordering_is_row_major() {
        assert!(point(9, 0) < point(0, 1));
        assert!(point(1, 1) > point(0, 1));
        let mut points = vec![point(3, 2), point(5, 0), point(0, 2)];
        points.sort();
        assert_eq!(points, vec![point(5, 0), point(0, 2), point(3, 2)]);
    }

    #[test]
    fn test_vector_arithmetic() {
        let delta = point(4, 3) - point(1, 1);
        assert_eq!(delta, TerminalVector { cols: 3, rows: 2 });
        assert_eq!(point(1, 1) + delta, point(4, 3));
        assert_eq!(point(4, 3) - delta, point(1, 1));
    }

    #[test_case('a', 1 ; "ascii")]
    #[test_case('\u{7}', 0 ; "control")]
    #[test_case('日', 2 ; "cjk")]
    #[test_case('é', 1 ; "latin")]
    fn test_char_width(ch: char, expected: u16) {
        assert_eq!(TABLE.char_width(ch), expected);
    }

    #[test_case("abc", point(0, 0), 10, point(3, 0) ; "no wrap")]
    #[test_case("abcde", point(0, 0), 5, point(0, 1) ; "exact fill wraps")]
    #[test_case("abcdefg", point(2, 0), 5, point(4, 1) ; "wrap from offset")]
    #[test_case("日本語", point(0, 0), 5, point(1, 1) ; "wide chars keep remainder")]
    #[test_case("ab\ncd", point(3, 4), 10, point(2, 5) ; "line feed")]
    #[test_case("abc\rd", point(0, 0), 10, point(1, 0) ; "carriage return")]
    #[test_case("abc", point(0, 0), 0, point(0, 3) ; "zero width is clamped")]
    fn test_next_position(text: &str, start: TerminalPoint, width: u16, end: TerminalPoint) {
        assert_eq!(next_position(text, start, width, &TABLE), end);
    }

    #[test_case("abcdefg", 5 ; "wrapping text")]
    #[test_case("日本語です", 7 ; "wide text")]
    #[test_case("$ ls\n> -la", 6 ; "line feed")]
    #[test_case("one\rtwo three", 4 ; "carriage return")]
    #[test_case("", 8 ; "empty")]
    fn test_prev_position_replays_to_same_end(text: &str, width: u16) {
        for start in [point(0, 0), point(0, 3), point(2, 1)] {
            let end = next_position(text, start, width, &TABLE);
            let recovered = prev_position(text, width, end, &TABLE);
            assert_eq!(next_position(text, recovered, width, &TABLE), end);
        }
    }

    #[test]
    fn test_prev_position_is_exact_without_breaks() {
        let start = point(3, 2);
        let end = next_position("hello world", start, 4, &TABLE);
        assert_eq!(prev_position("hello world", 4, end, &TABLE), start);
    }

    #[test]
    fn test_display_text_and_index() {
        assert_eq!(display_text("ab\ncd\ne"), "ab\n> cd\n> e");
        assert_eq!(display_index("ab\ncd", 2), 2);
        assert_eq!(display_index("ab\ncd", 4), 6);
    }
}
