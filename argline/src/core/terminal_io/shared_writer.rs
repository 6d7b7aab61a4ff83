// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::ok;
use std::io::{self, Write};

pub type Text = Vec<u8>;

/// Cloneable object that implements [`Write`] and allows for sending data to the terminal
/// without messing up the prompt and command line that a [`crate::Readline`] is editing.
///
/// # Create a new instance by creating a `Readline` instance
///
/// A [`SharedWriter`] is returned by [`crate::Readline::try_new()`] along with the
/// `Readline` it is associated with.
///
/// # Nothing is output without terminating with a newline, unless you call [`SharedWriter::flush()`]
///
/// Data written to a [`SharedWriter`] is only sent once a line feed (`'\n'`) has been
/// written. The monitor task spawned by [`crate::Readline::try_new()`] receives it, and
/// repaints the prompt below the new output.
#[derive(Debug)]
pub struct SharedWriter {
    /// Holds the data to be written to the terminal.
    pub buffer: Text,

    /// Sender end of the channel, the receiver end is in the monitor task of
    /// [`crate::Readline`], which does the actual printing.
    pub line_state_control_channel_sender: tokio::sync::mpsc::Sender<LineStateControlSignal>,

    /// This is set to `true` when this struct is cloned. Only the first instance of this
    /// struct will report errors when [`std::io::Write::write()`] fails, due to the
    /// receiver end of the channel being closed.
    pub silent_error: bool,

    /// Unique identifier for the `SharedWriter` instance.
    pub uuid: uuid::Uuid,
}

impl PartialEq for SharedWriter {
    fn eq(&self, other: &Self) -> bool { self.uuid == other.uuid }
}

/// Signals that can be sent to the `line` channel, which is monitored by the task.
#[derive(Debug, Clone)]
pub enum LineStateControlSignal {
    Line(Text),
    Flush,
    ExitReadlineLoop,
}

impl SharedWriter {
    /// Creates a new instance of `SharedWriter` with an empty buffer and a
    /// [`tokio::sync::mpsc::Sender`] end of the channel.
    #[must_use]
    pub fn new(line_sender: tokio::sync::mpsc::Sender<LineStateControlSignal>) -> Self {
        Self {
            buffer: Text::default(),
            line_state_control_channel_sender: line_sender,
            silent_error: false,
            uuid: uuid::Uuid::new_v4(),
        }
    }

    fn try_send_buffer(&mut self) -> io::Result<()> {
        match self
            .line_state_control_channel_sender
            .try_send(LineStateControlSignal::Line(self.buffer.clone()))
        {
            Ok(()) => {
                self.buffer.clear();
            }
            Err(_) => {
                if !self.silent_error {
                    return Err(io::Error::other("SharedWriter Receiver has closed"));
                }
            }
        }
        ok!()
    }
}

/// Each clone gets its own buffer and a clone of the
/// [`SharedWriter::line_state_control_channel_sender`], so every writer ends up in the
/// same channel that lives in the `Readline`.
impl Clone for SharedWriter {
    fn clone(&self) -> Self {
        Self {
            buffer: Text::default(),
            line_state_control_channel_sender: self.line_state_control_channel_sender.clone(),
            silent_error: true,
            uuid: self.uuid,
        }
    }
}

impl Write for SharedWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(payload);

        if self.buffer.ends_with(b"\n") {
            self.try_send_buffer()?;
        }

        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return ok!();
        }
        self.try_send_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_without_newline_is_buffered() {
        let (line_sender, _) = tokio::sync::mpsc::channel(1_000);
        let mut shared_writer = SharedWriter::new(line_sender);
        shared_writer.write_all(b"Hello, World!").unwrap();
        assert_eq!(shared_writer.buffer, b"Hello, World!");
    }

    #[tokio::test]
    async fn test_write_flush() {
        let (line_sender, mut line_receiver) = tokio::sync::mpsc::channel(1_000);
        let mut shared_writer = SharedWriter::new(line_sender);

        shared_writer.write_all(b"Hello, World!").unwrap();
        shared_writer.flush().unwrap();
        assert_eq!(shared_writer.buffer, b"");

        let it = line_receiver.recv().await.unwrap();
        let LineStateControlSignal::Line(bytes) = it else {
            panic!("Expected LineStateControlSignal::Line, got something else");
        };
        assert_eq!(bytes, b"Hello, World!".to_vec());
    }

    #[tokio::test]
    async fn test_writeln_sends_without_flush() {
        let (line_sender, mut line_receiver) = tokio::sync::mpsc::channel(1_000);
        let mut shared_writer = SharedWriter::new(line_sender);
        writeln!(shared_writer, "row {}", 1).unwrap();

        let it = line_receiver.recv().await.unwrap();
        let LineStateControlSignal::Line(bytes) = it else {
            panic!("Expected LineStateControlSignal::Line, got something else");
        };
        assert_eq!(bytes, b"row 1\n".to_vec());
    }

    #[tokio::test]
    async fn test_clone_silent_error() {
        let (line_sender, mut line_receiver) = tokio::sync::mpsc::channel(1_000);
        let mut shared_writer = SharedWriter::new(line_sender);
        assert!(!shared_writer.silent_error);

        let mut cloned_writer = shared_writer.clone();
        assert!(cloned_writer.silent_error);
        assert_eq!(cloned_writer, shared_writer);

        cloned_writer.write_all(b"Hello, World!\n").unwrap();
        assert!(cloned_writer.buffer.is_empty());

        // Will not produce error.
        line_receiver.close();
        cloned_writer.write_all(b"Hello, World!\n").unwrap();

        // Will produce error.
        assert!(shared_writer.write_all(b"error\n").is_err());
    }
}
