// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CrosstermEventResult, PinnedInputStream};
use async_stream::stream;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

/// Replays `generator_vec`, then ends. The main constructors built on it are:
/// - [`super::InputDeviceExtMock::new_mock()`]
/// - [`super::InputDeviceExtMock::new_mock_with_delay()`]
pub fn gen_input_stream<T>(generator_vec: Vec<T>) -> PinnedInputStream<T>
where
    T: Send + Sync + 'static,
{
    Box::pin(stream! {
        for item in generator_vec {
            yield item;
        }
    })
}

/// Like [`gen_input_stream`], but waits `delay` before every item. A long delay keeps a
/// read pending, which is how cancellation and shutdown are tested.
pub fn gen_input_stream_with_delay<T>(
    generator_vec: Vec<T>,
    delay: Duration,
) -> PinnedInputStream<T>
where
    T: Send + Sync + 'static,
{
    Box::pin(stream! {
        for item in generator_vec {
            tokio::time::sleep(delay).await;
            yield item;
        }
    })
}

/// A key press with `modifiers`.
#[must_use]
pub fn key_press(code: KeyCode, modifiers: KeyModifiers) -> CrosstermEventResult {
    Ok(Event::Key(KeyEvent::new(code, modifiers)))
}

/// One plain key press per char of `text`. No `Enter` at the end.
#[must_use]
pub fn typed_key_presses(text: &str) -> Vec<CrosstermEventResult> {
    text.chars()
        .map(|ch| key_press(KeyCode::Char(ch), KeyModifiers::NONE))
        .collect()
}
