// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{core::{InputMode, LineState, StashedLine},
            render::RepaintFrom};
use crate::{CARRIAGE_RETURN, History, LINE_FEED, Patch, ReadlineEvent, RenderOp,
            TerminalPoint, next_position};

impl LineState {
    /// Prints `data` above the prompt and paints the prompt and line again below it.
    ///
    /// 1. Erases the prompt and line.
    /// 2. If the previous output did not end with a line feed, goes back to where it
    ///    stopped, one row above the prompt.
    /// 3. Writes the data, line feeds also return the carriage.
    /// 4. Works out the new anchor from how the data wrapped, and repaints from it.
    pub fn print_data(&mut self, data: &[u8]) -> Patch {
        if data.is_empty() {
            return Patch::new();
        }
        let text = String::from_utf8_lossy(data).into_owned();
        let plain = strip_ansi_keep_returns(&text);

        let mut patch = Patch::from(vec![RenderOp::HideCursor]);
        patch.append(self.erase());

        let out_start = if self.last_line_completed {
            self.anchor
        } else {
            let start = TerminalPoint::new(self.last_line_col, self.anchor.row - 1);
            patch.push(RenderOp::MoveTo(start));
            start
        };
        patch.push(RenderOp::Print(text));

        let out_end = next_position(&plain, out_start, self.width(), self.width_table.as_ref());
        let next_anchor = match plain.chars().last() {
            Some(LINE_FEED) => {
                self.last_line_completed = true;
                self.last_line_col = 0;
                out_end
            }
            // Ended exactly at the right edge, the terminal has not wrapped yet.
            Some(ch) if ch != CARRIAGE_RETURN && out_end.col == 0 => {
                patch.push(RenderOp::Print(LINE_FEED.to_string()));
                self.last_line_completed = true;
                self.last_line_col = 0;
                out_end
            }
            _ => {
                // The prompt goes on the next row.
                patch.push(RenderOp::Print(LINE_FEED.to_string()));
                self.last_line_completed = false;
                self.last_line_col = out_end.col;
                TerminalPoint::new(0, out_end.row + 1)
            }
        };
        self.set_anchor_clamped(next_anchor);

        patch.append(self.repaint(RepaintFrom::Prompt));
        patch
    }

    /// Swaps the prompt for `prompt` and starts an empty [`InputMode::Password`] line.
    /// The current prompt and line come back after the password is submitted.
    pub fn begin_password(&mut self, prompt: &str, mask: char) -> Patch {
        self.stashed = Some(StashedLine {
            prompt: std::mem::take(&mut self.prompt),
            line: std::mem::take(&mut self.line),
            cursor: self.cursor,
        });
        self.set_prompt_text(prompt);
        self.mode = InputMode::Password { mask };
        self.reset_line();
        self.repaint(RepaintFrom::Prompt)
    }

    /// Back to [`InputMode::Normal`]. The password buffer is wiped.
    pub fn end_password(&mut self) {
        if !self.is_password_mode() {
            return;
        }
        self.reset_line();
        self.mode = InputMode::Normal;
        if let Some(stashed) = self.stashed.take() {
            self.set_prompt_text(&stashed.prompt);
            self.line = stashed.line;
            self.cursor = stashed.cursor.min(self.len());
        }
    }

    /// Enter: hands out the line (recorded in `history`) or the sealed password, and
    /// paints a fresh prompt below it.
    pub fn submit(&mut self, history: &mut History) -> (Patch, ReadlineEvent) {
        let mut patch = self.finish_line(self.should_print_line_on_enter);
        let event = match self.mode {
            InputMode::Normal => {
                let line = std::mem::take(&mut self.line);
                history.record(line.clone());
                self.reset_line();
                ReadlineEvent::Line(line)
            }
            InputMode::Password { .. } => {
                let mut secure = std::mem::take(&mut self.secure);
                secure.seal();
                self.end_password();
                ReadlineEvent::Password(secure)
            }
        };
        patch.append(self.repaint(RepaintFrom::Prompt));
        (patch, event)
    }

    /// Ctrl+C: drops the line and paints a fresh prompt.
    pub fn interrupt(&mut self, history: &mut History) -> (Patch, ReadlineEvent) {
        let mut patch = self.finish_line(self.should_print_line_on_control_c);
        self.end_password();
        self.reset_line();
        history.reset_navigation();
        patch.append(self.repaint(RepaintFrom::Prompt));
        (patch, ReadlineEvent::Interrupted)
    }

    /// Ctrl+D on an empty line. The prompt is erased and not painted again until the
    /// next read.
    pub fn end_of_file(&mut self) -> (Patch, ReadlineEvent) {
        self.end_password();
        self.reset_line();
        let mut patch = self.erase();
        patch.push(RenderOp::ShowCursor);
        (patch, ReadlineEvent::Eof)
    }

    /// A read was cancelled from outside. Whatever was typed is dropped.
    pub fn cancel(&mut self) -> Patch {
        self.end_password();
        self.reset_line();
        self.repaint(RepaintFrom::Prompt)
    }

    /// Clears the line state and prepares the terminal for exit.
    pub fn exit(&mut self) -> Patch {
        self.end_password();
        self.reset_line();
        let mut patch = self.erase();
        patch.push(RenderOp::reset_attributes());
        patch.push(RenderOp::ShowCursor);
        patch
    }

    /// Leaves the line on screen and moves the anchor below it, or erases it.
    fn finish_line(&mut self, keep_on_screen: bool) -> Patch {
        if !keep_on_screen {
            return self.erase();
        }
        let end = self.end_point();
        let mut patch = Patch::from(vec![RenderOp::MoveTo(end)]);
        let next_anchor = if self.ends_in_pending_wrap() {
            end
        } else {
            patch.push(RenderOp::Print(LINE_FEED.to_string()));
            TerminalPoint::new(0, end.row + 1)
        };
        self.set_anchor_clamped(next_anchor);
        patch
    }
}

/// [`strip_ansi_escapes`] also drops `\r`, which matters for where the cursor ends up.
fn strip_ansi_keep_returns(text: &str) -> String {
    text.split(CARRIAGE_RETURN)
        .map(strip_ansi_escapes::strip_str)
        .collect::<Vec<_>>()
        .join("\r")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edit, EditContext, OutputDevice, OutputDeviceExt, lock_output_device_as_mut};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_data_puts_prompt_below_output() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.anchor = TerminalPoint::new(0, 3);
        line_state.line = "ls -la".into();
        line_state.cursor = 2;

        let patch = line_state.print_data(b"first\nsecond\n");

        assert_eq!(line_state.anchor, TerminalPoint::new(0, 5));
        assert!(line_state.last_line_completed);
        assert_eq!(line_state.line, "ls -la");
        assert_eq!(line_state.cursor_point(), TerminalPoint::new(4, 5));
        assert!(
            patch
                .to_ansi_string()
                .contains("\x1b[4;1f\x1b[0Jfirst\r\nsecond\r\n")
        );
    }

    #[test]
    fn test_print_data_continues_an_incomplete_line() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.anchor = TerminalPoint::new(0, 3);

        line_state.print_data(b"loading");
        assert!(!line_state.last_line_completed);
        assert_eq!(line_state.last_line_col, 7);
        assert_eq!(line_state.anchor, TerminalPoint::new(0, 4));

        let patch = line_state.print_data(b"... done\n");
        assert!(patch.ops.contains(&RenderOp::MoveTo(TerminalPoint::new(7, 3))));
        assert!(line_state.last_line_completed);
        assert_eq!(line_state.anchor, TerminalPoint::new(0, 4));
    }

    #[test]
    fn test_print_data_wraps_and_scrolls() {
        let mut line_state = LineState::new("$ ".into(), (10, 4));
        line_state.anchor = TerminalPoint::new(0, 3);

        // 25 cells is three rows, the screen scrolls and the prompt stays on the last row.
        line_state.print_data(format!("{}\n", "x".repeat(25)).as_bytes());

        assert_eq!(line_state.anchor, TerminalPoint::new(0, 3));
    }

    #[test]
    fn test_print_data_strips_ansi_for_geometry() {
        let mut line_state = LineState::new("$ ".into(), (10, 24));
        line_state.print_data(b"\x1b[31mred\x1b[0m");
        assert_eq!(line_state.last_line_col, 3);
        assert_eq!(line_state.anchor, TerminalPoint::new(0, 1));
    }

    #[tokio::test]
    async fn test_submit_records_history_and_repaints_prompt() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        let (mut history, _) = History::new();
        let mut ctx = EditContext::new(&mut history);
        line_state
            .apply(Edit::InsertText("echo hi".into()), &mut ctx)
            .unwrap()
            .flush(lock_output_device_as_mut!(output_device))
            .unwrap();

        let (patch, event) = line_state.submit(&mut history);
        patch
            .flush(lock_output_device_as_mut!(output_device))
            .unwrap();

        assert_eq!(event, ReadlineEvent::Line("echo hi".into()));
        assert_eq!(history.entries, vec!["echo hi".to_string()]);
        assert!(history.is_past_end());
        assert!(line_state.line.is_empty());
        assert_eq!(line_state.anchor, TerminalPoint::new(0, 1));
        assert!(
            stdout_mock
                .get_copy_of_buffer_as_string_strip_ansi()
                .replace('\r', "")
                .ends_with("echo hi\n$ ")
        );
    }

    #[tokio::test]
    async fn test_submit_without_echo_erases_line() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.should_print_line_on_enter = false;
        line_state.anchor = TerminalPoint::new(0, 2);
        line_state.line = "quiet".into();
        let (mut history, _) = History::new();

        let (patch, _) = line_state.submit(&mut history);

        assert_eq!(line_state.anchor, TerminalPoint::new(0, 2));
        assert_eq!(patch.ops[0], RenderOp::MoveTo(TerminalPoint::new(0, 2)));
        assert_eq!(patch.ops[1], RenderOp::EraseToEndOfScreen);
    }

    #[tokio::test]
    async fn test_password_round_trip_restores_normal_line() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.line = "draft".into();
        line_state.cursor = 5;
        let (mut history, _) = History::new();

        line_state.begin_password("Password: ", '•');
        assert!(line_state.is_password_mode());
        assert!(line_state.line.is_empty());
        let mut ctx = EditContext::new(&mut history);
        line_state.apply(Edit::InsertText("pa55".into()), &mut ctx).unwrap();
        assert_eq!(line_state.visible_line(), "••••");

        let (_, event) = line_state.submit(&mut history);

        let ReadlineEvent::Password(secure) = event else {
            panic!("expected a password");
        };
        assert_eq!(secure.as_unsecure_str(), "pa55");
        assert!(secure.is_read_only());
        assert!(history.entries.is_empty());
        assert!(!line_state.is_password_mode());
        assert_eq!(line_state.prompt, "$ ");
        assert_eq!(line_state.line, "draft");
        assert_eq!(line_state.cursor, 5);
    }

    #[tokio::test]
    async fn test_interrupt_drops_line() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.line = "half typed".into();
        line_state.cursor = 4;
        let (mut history, _) = History::new();

        let (_, event) = line_state.interrupt(&mut history);

        assert_eq!(event, ReadlineEvent::Interrupted);
        assert!(line_state.line.is_empty());
        assert_eq!(line_state.cursor, 0);
        assert!(history.entries.is_empty());
    }

    #[test]
    fn test_carriage_return_rewinds_incomplete_line() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.print_data(b"50%\r");
        assert!(!line_state.last_line_completed);
        assert_eq!(line_state.last_line_col, 0);
        assert_eq!(strip_ansi_keep_returns("\x1b[1ma\rb"), "a\rb");
    }

    #[test]
    fn test_exit_clears_line() {
        let mut line_state = LineState::new("$ ".into(), (80, 24));
        line_state.line = "some content".into();

        let patch = line_state.exit();

        assert!(line_state.line.is_empty());
        assert_eq!(patch.ops.last(), Some(&RenderOp::ShowCursor));
    }
}
