// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CrosstermEventResult, PinnedInputStream};
use async_stream::stream;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers};
use futures_util::{FutureExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Where the events of an [`InputDevice`] come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDeviceKind {
    /// A real terminal in raw mode.
    EventStream,
    /// Lines read from a redirected `stdin`, replayed as key presses.
    PipedStdin,
    /// Canned events, for tests.
    Mock,
}

/// This struct represents an input device that can be used to read from the terminal. See
/// [`crate::InputDeviceExtMock`] for testing features.
#[allow(missing_debug_implementations)]
pub struct InputDevice {
    pub resource: PinnedInputStream<CrosstermEventResult>,
    pub kind: InputDeviceKind,
}

impl InputDevice {
    #[must_use]
    pub fn new_event_stream() -> InputDevice {
        InputDevice {
            resource: Box::pin(EventStream::new()),
            kind: InputDeviceKind::EventStream,
        }
    }

    /// Reads `stdin` line by line when it is not a terminal (e.g. `cat script |
    /// my_repl`). Each line turns into one key press per char followed by `Enter`, so the
    /// same readline loop drives interactive and redirected sessions. The stream ends at
    /// EOF.
    #[must_use]
    pub fn new_piped_stdin() -> InputDevice {
        let it = stream! {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        for event in line_to_key_events(&line) {
                            yield Ok(event);
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        };
        InputDevice {
            resource: Box::pin(it),
            kind: InputDeviceKind::PipedStdin,
        }
    }

    /// Only a real terminal gets switched into raw mode.
    #[must_use]
    pub fn needs_raw_mode(&self) -> bool { self.kind == InputDeviceKind::EventStream }

    /// Returns [`None`] when the underlying stream is exhausted.
    pub async fn next_input_event(&mut self) -> Option<CrosstermEventResult> {
        self.resource.next().fuse().await
    }
}

/// One key press per char, then `Enter`.
#[must_use]
pub fn line_to_key_events(line: &str) -> Vec<Event> {
    line.chars()
        .filter(|ch| *ch != '\r')
        .map(|ch| Event::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE)))
        .chain(std::iter::once(Event::Key(KeyEvent::new(
            KeyCode::Enter,
            KeyModifiers::NONE,
        ))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InputDeviceExtMock, gen_input_stream};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_to_key_events() {
        let events = line_to_key_events("ab\r");
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Event::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE))
        );
        assert_eq!(
            events[2],
            Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
        );
    }

    #[tokio::test]
    async fn test_next_input_event_ends_with_stream() {
        let mut device = InputDevice {
            resource: gen_input_stream(vec![Ok(Event::FocusGained)]),
            kind: InputDeviceKind::Mock,
        };
        assert!(matches!(
            device.next_input_event().await,
            Some(Ok(Event::FocusGained))
        ));
        assert!(device.next_input_event().await.is_none());
        assert!(!device.needs_raw_mode());
        assert!(!InputDevice::new_mock(vec![]).needs_raw_mode());
    }
}
