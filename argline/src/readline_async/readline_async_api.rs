// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CancelHandle, CompletionSource, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MASK_CHAR,
            HISTORY_SIZE_MAX, InputDevice, KeyBindings, LineStateControlSignal,
            OutputDevice, Readline, ReadlineEvent, SharedWriter, StdinIsPipedResult,
            StdoutIsPipedResult, TTYResult, TokenizerOptions,
            is_fully_uninteractive_terminal, is_stdin_piped, is_stdout_piped,
            send_signal};
use futures_util::FutureExt as _;
use miette::IntoDiagnostic as _;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything that can be tuned on a [`ReadlineAsyncContext`] before it starts.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct ReadlineOptions {
    pub prompt: String,
    pub history_max: usize,
    pub mask_char: char,
    pub should_print_line_on_enter: bool,
    pub should_print_line_on_control_c: bool,
    /// Room in the channel between [`SharedWriter`]s and the output monitor task.
    pub channel_capacity: usize,
    /// Used to split the line for completion.
    pub tokenizer_options: TokenizerOptions,
    pub key_bindings: KeyBindings,
    pub completion_source: Option<Arc<dyn CompletionSource + Send + Sync>>,
}

impl Default for ReadlineOptions {
    fn default() -> Self {
        Self {
            prompt: "> ".into(),
            history_max: HISTORY_SIZE_MAX,
            mask_char: DEFAULT_MASK_CHAR,
            should_print_line_on_enter: true,
            should_print_line_on_control_c: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            tokenizer_options: TokenizerOptions::default(),
            key_bindings: KeyBindings::platform_default(),
            completion_source: None,
        }
    }
}

impl ReadlineOptions {
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_completion_source(
        mut self,
        source: impl CompletionSource + Send + Sync + 'static,
    ) -> Self {
        self.completion_source = Some(Arc::new(source));
        self
    }
}

#[allow(missing_debug_implementations)]
pub struct ReadlineAsyncContext {
    pub readline: Readline,
    pub shared_writer: SharedWriter,
}

/// Don't change the `content`. Print it as is, above the prompt. It is compatible w/ the
/// [`ReadlineAsyncContext::read_line`] method.
#[macro_export]
macro_rules! rla_println {
    (
        $rla:ident,
        $($format:tt)*
    ) => {{
        use std::io::Write as _;
        _ = writeln!($rla.shared_writer, $($format)*);
    }};
}

#[macro_export]
macro_rules! rla_print {
    (
        $rla:ident,
        $($format:tt)*
    ) => {{
        use std::io::Write as _;
        _ = write!($rla.shared_writer, $($format)*);
    }};
}

impl ReadlineAsyncContext {
    /// Create a new instance for the process' terminal.
    ///
    /// # Returns
    /// 1. [None] if `stdout` is piped, e.g. `my_repl | less`, or if none of `stdin`,
    ///    `stdout`, `stderr` is a TTY, e.g. when running in `cargo test`.
    /// 2. Otherwise a new instance. When only `stdin` is piped, e.g. `cat script |
    ///    my_repl`, lines are read from it instead of the keyboard.
    ///
    /// # Errors
    ///
    /// Returns an error if setting up the terminal fails.
    pub fn try_new(options: ReadlineOptions) -> miette::Result<Option<Self>> {
        if let StdoutIsPipedResult::StdoutIsPiped = is_stdout_piped() {
            return Ok(None);
        }
        if let TTYResult::IsNotInteractive = is_fully_uninteractive_terminal() {
            return Ok(None);
        }

        let input_device = match is_stdin_piped() {
            StdinIsPipedResult::StdinIsPiped => InputDevice::new_piped_stdin(),
            StdinIsPipedResult::StdinIsNotPiped => InputDevice::new_event_stream(),
        };

        Self::try_new_with_devices(options, OutputDevice::new_stdout(), input_device)
            .map(Some)
    }

    /// Create a new instance that reads from `input_device` and renders to
    /// `output_device`. See [`crate::InputDeviceExtMock`] and [`crate::OutputDeviceExt`]
    /// for mocks.
    ///
    /// # Errors
    ///
    /// Returns an error if setting up the terminal fails.
    pub fn try_new_with_devices(
        options: ReadlineOptions,
        output_device: OutputDevice,
        /* move */ input_device: InputDevice,
    ) -> miette::Result<Self> {
        let (shutdown_complete_sender, _) = broadcast::channel::<()>(1);

        let (mut readline, shared_writer) = Readline::try_new(
            options.prompt,
            output_device,
            input_device,
            shutdown_complete_sender,
            options.channel_capacity,
        )
        .into_diagnostic()?;

        readline.should_print_line_on(
            options.should_print_line_on_enter,
            options.should_print_line_on_control_c,
        );
        readline.set_max_history(options.history_max);
        readline.settings.key_bindings = options.key_bindings;
        readline.settings.tokenizer_options = options.tokenizer_options;
        readline.settings.mask_char = options.mask_char;
        readline.set_completion_source(options.completion_source);

        Ok(Self {
            readline,
            shared_writer,
        })
    }

    #[must_use]
    pub fn clone_shared_writer(&self) -> SharedWriter { self.shared_writer.clone() }

    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle { self.readline.cancel_handle() }

    /// Replacement for [`std::io::Stdin::read_line()`] (this is async and non-blocking).
    ///
    /// # Errors
    ///
    /// See [`Readline::readline()`].
    pub async fn read_line(&mut self) -> miette::Result<ReadlineEvent> {
        self.readline.readline().fuse().await.into_diagnostic()
    }

    /// Reads a password with `prompt`, what is typed is masked.
    ///
    /// # Errors
    ///
    /// See [`Readline::read_password()`].
    pub async fn read_password(&mut self, prompt: &str) -> miette::Result<ReadlineEvent> {
        self.readline.read_password(prompt).fuse().await.into_diagnostic()
    }

    /// Waits for a single key press.
    ///
    /// # Errors
    ///
    /// See [`Readline::read_key()`].
    pub async fn read_key(&mut self) -> miette::Result<ReadlineEvent> {
        self.readline.read_key().fuse().await.into_diagnostic()
    }

    /// Simply flush the buffer. If there's a newline in the buffer, it will be printed.
    /// Otherwise, it won't.
    pub async fn flush(&mut self) {
        _ = send_signal!(self.shared_writer, LineStateControlSignal::Flush);
    }

    /// Call this when you are done. It prints `message` if provided, and exits the
    /// readline loop gracefully:
    ///
    /// 1. it sends a [`LineStateControlSignal::ExitReadlineLoop`] signal to the output
    ///    monitor task,
    /// 2. which sends a message on the shutdown channel,
    /// 3. which causes [`Readline::readline()`] to return [`crate::ReadlineError::Closed`]
    ///    if it is currently running.
    ///
    /// If this isn't called, dropping the [`Readline`] still erases the prompt and shows
    /// the cursor, but won't print any exit message.
    ///
    /// # Errors
    ///
    /// Returns an error if the output monitor task is already gone.
    pub async fn request_shutdown(self, message: Option<&str>) -> miette::Result<()> {
        if let Some(message) = message {
            let line = format!("{message}\n").into_bytes();
            send_signal!(self.shared_writer, LineStateControlSignal::Line(line))
                .into_diagnostic()?;
            send_signal!(self.shared_writer, LineStateControlSignal::Flush)
                .into_diagnostic()?;
        }

        send_signal!(self.shared_writer, LineStateControlSignal::ExitReadlineLoop)
            .into_diagnostic()?;

        // Pause to allow all the messages to be printed.
        tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;

        drop(self);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CrosstermEventResult, Descriptor, DescriptorSet, InputDeviceExtMock,
                OutputDeviceExt, ValueType, key_press, typed_key_presses as typed};
    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn key(code: KeyCode) -> CrosstermEventResult { key_press(code, KeyModifiers::NONE) }

    #[tokio::test]
    async fn test_read_line_with_options() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let mut input = typed("ls");
        input.push(key(KeyCode::Enter));
        let mut rl_ctx = ReadlineAsyncContext::try_new_with_devices(
            ReadlineOptions::default().with_prompt("$ "),
            output_device,
            InputDevice::new_mock(input),
        )
        .unwrap();

        let event = rl_ctx.read_line().await.unwrap();

        assert_eq!(event, ReadlineEvent::Line("ls".into()));
        assert!(
            stdout_mock
                .get_copy_of_buffer_as_string_strip_ansi()
                .contains("$ ls\n$ ")
        );
    }

    #[tokio::test]
    async fn test_tab_completes_from_descriptor_set() {
        let set = DescriptorSet::new(vec![
            Descriptor::optional("profile")
                .short('p')
                .value_type(ValueType::Choice(vec!["debug".into(), "release".into()])),
        ])
        .unwrap();
        let mut input = typed("--pro");
        input.push(key(KeyCode::Tab));
        input.push(key(KeyCode::Enter));
        let (output_device, _) = OutputDevice::new_mock();
        let mut rl_ctx = ReadlineAsyncContext::try_new_with_devices(
            ReadlineOptions::default().with_completion_source(set),
            output_device,
            InputDevice::new_mock(input),
        )
        .unwrap();

        let event = rl_ctx.read_line().await.unwrap();

        assert_eq!(event, ReadlineEvent::Line("--profile".into()));
    }

    #[tokio::test]
    async fn test_rla_println_and_request_shutdown() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let mut rl_ctx = ReadlineAsyncContext::try_new_with_devices(
            ReadlineOptions::default(),
            output_device,
            InputDevice::new_mock_with_delay(vec![], Duration::from_secs(60)),
        )
        .unwrap();

        crate::rla_println!(rl_ctx, "loaded {} profiles", 2);
        rl_ctx.flush().await;
        rl_ctx.request_shutdown(Some("bye")).await.unwrap();

        let output = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert!(output.contains("loaded 2 profiles\n"));
        assert!(output.contains("bye\n"));
    }
}
