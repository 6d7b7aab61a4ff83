// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CompletionSource, CrosstermEventResult, DEFAULT_HEIGHT, DEFAULT_MASK_CHAR,
            DEFAULT_WIDTH, EditContext, History, InputDevice, InputDeviceKind, KeyBindings,
            LineState, LineStateControlSignal, OutputDevice, Patch, RenderOp,
            RepaintFrom, SafeHistory, SafeLineState, SecureBuffer, SharedWriter, StdMutex,
            TerminalPoint, TokenizerOptions, get_size_or_default,
            lock_output_device_as_mut};
use crossterm::{event::{Event, KeyEvent, KeyEventKind},
                terminal};
use miette::{Diagnostic, Report as ErrorReport};
use std::{io,
          sync::{Arc,
                 atomic::{AtomicBool, Ordering}}};
use thiserror::Error;
use tokio::{select, spawn,
            sync::{Notify, broadcast,
                   mpsc::{self, UnboundedReceiver, UnboundedSender}},
            task::JoinHandle};

/// # Mental model and overview
///
/// This is a replacement for a [`std::io::BufRead::read_line`] function. It is async. It
/// supports other tasks concurrently writing to the terminal output (via
/// [`SharedWriter`]s), and those writes show up above the prompt without disturbing the
/// line being edited.
///
/// When you call [`Self::readline()`] it enters a loop. During which you can type things
/// into the multiline editor, which also displays the prompt. While in this loop other
/// tasks can send messages to the `Readline` via the `line` channel, using the
/// [`SharedWriter::line_state_control_channel_sender`].
///
/// When you create a new [`Readline`] instance, a task, is started via
/// [`manage_shared_writer_output::spawn_task_to_monitor_line_control_channel()`]. This
/// task monitors the `line` channel, and prints whatever arrives on it.
///
/// # Reading sessions
///
/// Each of [`Self::readline()`], [`Self::read_password()`] and [`Self::read_key()`] is
/// one reading session. It moves [`SessionState`] from `Idle` to `Reading`, and ends in
/// `Ended`, or in `Cancelled` when the read was cancelled or interrupted with `Ctrl+C`.
/// The terminal is acquired for the duration of the session
/// (raw mode, only if it was not already on) and released on every way out, including
/// when the future is dropped half way.
///
/// A session can be cancelled from another task with a [`CancelHandle`]. The read loop
/// checks the flag on every iteration, and returns [`ReadlineEvent::Cancelled`].
///
/// # How or when to terminate the session
///
/// There is no `close()` function on [`Readline`]. You simply drop it. This will erase
/// the prompt and show the cursor. To stop a `readline()` that is currently running from
/// elsewhere, send [`LineStateControlSignal::ExitReadlineLoop`] (see
/// [`crate::ReadlineAsyncContext::request_shutdown()`]).
///
/// # Inputs and dependency injection
///
/// There are 2 main resources that must be passed into [`Self::try_new()`]:
/// 1. [`InputDevice`], an async stream of [`crossterm::event::Event`]s. Usually
///    [`crossterm::event::EventStream`], for tests a canned stream.
/// 2. [`OutputDevice`], anything `dyn std::io::Write + Send`. Usually
///    [`std::io::Stdout`], for tests a [`crate::StdoutMock`].
///
/// # Lock order
///
/// Line state, then history, then the output device. The monitor task takes the line
/// state and then the output device, so output is never interleaved with a repaint.
#[allow(missing_debug_implementations)]
pub struct Readline {
    /// Device used to write rendered display output to (usually `stdout`).
    pub output_device: OutputDevice,

    /// Device used to get stream of events from user (usually `stdin`).
    pub input_device: InputDevice,

    /// Current line.
    pub safe_line_state: SafeLineState,

    /// Use to send history updates.
    pub history_sender: UnboundedSender<String>,
    /// Use to receive history updates.
    pub history_receiver: UnboundedReceiver<String>,
    /// Manages the history.
    pub safe_history: SafeHistory,

    pub settings: EditSettings,

    session_state: SessionState,

    cancel_handle: CancelHandle,

    /// Shutdown channel.
    shutdown_complete_sender: broadcast::Sender<()>,
}

/// How keys are turned into edits.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct EditSettings {
    pub key_bindings: KeyBindings,
    pub completion_source: Option<Arc<dyn CompletionSource + Send + Sync>>,
    pub tokenizer_options: TokenizerOptions,
    /// Painted for every char of a password.
    pub mask_char: char,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            key_bindings: KeyBindings::default(),
            completion_source: None,
            tokenizer_options: TokenizerOptions::default(),
            mask_char: DEFAULT_MASK_CHAR,
        }
    }
}

/// Error returned from [`readline()`][Readline::readline]. Such errors generally require
/// specific procedures to recover from.
#[derive(Debug, Error, Diagnostic)]
pub enum ReadlineError {
    /// An internal I/O error occurred.
    #[error(transparent)]
    #[diagnostic(code(argline::readline::io))]
    IO(#[from] io::Error),

    /// `readline()` was called after the [`SharedWriter`] was dropped and everything
    /// written to the `SharedWriter` was already output.
    #[error("line writers closed")]
    #[diagnostic(code(argline::readline::closed))]
    Closed,

    /// The operation is not allowed in the current input mode. The read goes on.
    #[error("invalid operation: {0}")]
    #[diagnostic(code(argline::readline::invalid_operation))]
    InvalidOperation(&'static str),
}

/// For convenience, convert [`ErrorReport`] to [`ReadlineError`],
/// so that `into_diagnostic()` works.
impl From<ErrorReport> for ReadlineError {
    fn from(report: ErrorReport) -> Self {
        ReadlineError::IO(io::Error::other(format!("{report}")))
    }
}

/// Events emitted by a reading session.
#[derive(Debug, PartialEq, Clone)]
pub enum ReadlineEvent {
    /// The user entered a line of text.
    Line(String),

    /// The user entered a password, see [`Readline::read_password()`].
    Password(SecureBuffer),

    /// A key press, see [`Readline::read_key()`].
    Key(KeyEvent),

    /// The user pressed `Ctrl+D` on an empty line, or the input ran out.
    Eof,

    /// The user pressed `Ctrl+C`. The session ends in [`SessionState::Cancelled`].
    Interrupted,

    /// The read was cancelled with a [`CancelHandle`].
    Cancelled,
}

/// Where a [`Readline`] is in its current (or last) reading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Reading,
    Ended,
    Cancelled,
}

/// Cooperative cancellation of the reading session in progress. Cloneable and `Send`,
/// so it can be handed to other tasks. Cancelling while no read is in progress has no
/// effect on the next read.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.flag.load(Ordering::SeqCst) }

    fn reset(&self) { self.flag.store(false, Ordering::SeqCst); }

    async fn notified(&self) { self.notify.notified().await; }
}

/// Internal control flow for the `readline` method. This is used primarily to make
/// testing easier.
#[derive(Debug, PartialEq, Clone)]
pub enum ControlFlowExtended<T, E> {
    ReturnOk(T),
    ReturnError(E),
    Continue,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ControlFlowLimited<E> {
    ReturnError(E),
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    Line,
    Key,
}

/// Holds the terminal for one reading session. Raw mode is only switched on for a real
/// terminal that is not already in it, and only then switched off again on drop. The
/// cursor is always shown and attributes reset on drop.
struct ReadingSession {
    output_device: OutputDevice,
    enabled_raw_mode: bool,
}

impl ReadingSession {
    fn acquire(
        output_device: &OutputDevice,
        input_device: &InputDevice,
    ) -> Result<Self, ReadlineError> {
        let enabled_raw_mode = !output_device.is_mock
            && input_device.needs_raw_mode()
            && !terminal::is_raw_mode_enabled()?;
        if enabled_raw_mode {
            terminal::enable_raw_mode()?;
        }
        tracing::debug!(message = "reading session acquired", enabled_raw_mode);
        Ok(Self {
            output_device: output_device.clone(),
            enabled_raw_mode,
        })
    }
}

impl Drop for ReadingSession {
    fn drop(&mut self) {
        let patch = Patch::from(vec![RenderOp::reset_attributes(), RenderOp::ShowCursor]);
        // We don't care about the result of this operation.
        patch
            .flush(lock_output_device_as_mut!(self.output_device))
            .ok();
        if self.enabled_raw_mode {
            // We don't care about the result of this operation.
            terminal::disable_raw_mode().ok();
        }
        tracing::debug!(message = "reading session released");
    }
}

/// # Task creation, shutdown and cleanup
///
/// The task spawned by
/// [`manage_shared_writer_output::spawn_task_to_monitor_line_control_channel()`] doesn't
/// need to be shutdown. The loop awaits on the channel, and ends when every
/// [`SharedWriter`] (the senders) is dropped, or when it is told to with
/// [`LineStateControlSignal::ExitReadlineLoop`].
///
/// # Support for writing output from [`SharedWriter`]s
///
/// - This module contains the logic for managing the `line_state_control_channel` that's
///   created in [`Readline::try_new()`].
/// - This channel is used to send signals *from* [`SharedWriter`]s *to* the
///   [`LineState`], which prints the output above the prompt.
pub mod manage_shared_writer_output {
    use super::{ControlFlowLimited, JoinHandle, LineStateControlSignal, OutputDevice,
                ReadlineError, SafeLineState, broadcast, lock_output_device_as_mut, mpsc,
                spawn};

    /// - Receiver end of the channel, which does the actual writing to the terminal.
    /// - The sender end of the channel is in [`crate::SharedWriter`].
    pub fn spawn_task_to_monitor_line_control_channel(
        /* Move */
        mut line_control_channel_receiver: mpsc::Receiver<LineStateControlSignal>,
        safe_line_state: SafeLineState,
        output_device: OutputDevice,
        shutdown_complete_sender: broadcast::Sender<()>,
    ) -> JoinHandle<()> {
        spawn(async move {
            loop {
                // This branch is cancel safe because recv is cancel safe.
                let maybe_line_control_signal = line_control_channel_receiver.recv();

                // if-let scope has changed in Rust 2024, so use match here and not
                // if-let.
                #[allow(clippy::single_match_else)]
                match maybe_line_control_signal.await {
                    Some(line_control_signal) => {
                        let control_flow = process_line_control_signal(
                            line_control_signal,
                            &safe_line_state,
                            &output_device,
                        );
                        match control_flow {
                            ControlFlowLimited::ReturnError(err) => {
                                tracing::debug!(
                                    message = "line control channel monitor stopping",
                                    reason = %err
                                );
                                // We don't care about the result of this operation.
                                shutdown_complete_sender.send(()).ok();
                                break;
                            }
                            ControlFlowLimited::Continue => {}
                        }
                    }
                    _ => {
                        tracing::debug!(message = "line control channel closed");
                        // We don't care about the result of this operation.
                        shutdown_complete_sender.send(()).ok();
                        break;
                    }
                }
            }
        })
    }

    /// Process a line control signal. And actually write the line to the terminal.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn process_line_control_signal(
        line_control_signal: LineStateControlSignal,
        safe_line_state: &SafeLineState,
        output_device: &OutputDevice,
    ) -> ControlFlowLimited<ReadlineError> {
        match line_control_signal {
            LineStateControlSignal::ExitReadlineLoop => {
                // This causes the readline loop to request_shutdown by using
                // `Readline::shutdown_complete_sender`.
                return ControlFlowLimited::ReturnError(ReadlineError::Closed);
            }

            LineStateControlSignal::Line(buf) => {
                let mut line_state = safe_line_state.lock().unwrap();
                let patch = line_state.print_data(&buf);
                let term = lock_output_device_as_mut!(output_device);
                if let Err(err) = patch.flush(term) {
                    return ControlFlowLimited::ReturnError(err.into());
                }
            }

            LineStateControlSignal::Flush => {
                let _line_state = safe_line_state.lock().unwrap();
                let term = lock_output_device_as_mut!(output_device);
                if let Err(err) = term.flush() {
                    return ControlFlowLimited::ReturnError(err.into());
                }
            }
        }

        ControlFlowLimited::Continue
    }
}

impl Drop for Readline {
    fn drop(&mut self) {
        let patch = self.safe_line_state.lock().unwrap().exit();
        // We don't care about the result of this operation.
        patch
            .flush(lock_output_device_as_mut!(self.output_device))
            .ok();
    }
}

impl Readline {
    /// Create a new instance with an associated [`SharedWriter`]. To customize the
    /// behavior of this instance, you can use the following methods:
    /// - [`Self::should_print_line_on`]
    /// - [`Self::set_max_history`]
    /// - [`Self::set_completion_source`]
    ///
    /// The cursor position of a real terminal is read once here, that is where the
    /// prompt goes. If it can't be read, the prompt goes on the last row.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal operations fail.
    #[allow(clippy::needless_pass_by_value)]
    pub fn try_new(
        prompt: String,
        output_device: OutputDevice,
        /* move */ input_device: InputDevice,
        /* move */ shutdown_complete_sender: broadcast::Sender<()>,
        channel_capacity: usize,
    ) -> Result<(Self, SharedWriter), ReadlineError> {
        // Line control channel - signals are send to this channel to control `LineState`.
        // A task is spawned to monitor this channel.
        let (line_control_channel_sender, line_state_control_channel_receiver) =
            mpsc::channel::<LineStateControlSignal>(channel_capacity.max(1));

        // History setup.
        let (history, history_receiver) = History::new();
        let history_sender = history.sender.clone();
        let safe_history = Arc::new(StdMutex::new(history));

        // Line state.
        let term_size = if output_device.is_mock {
            (DEFAULT_WIDTH, DEFAULT_HEIGHT)
        } else {
            get_size_or_default()
        };
        let mut line_state = LineState::new(prompt, term_size);
        line_state.anchor = initial_anchor(&output_device, &input_device, term_size);
        let safe_line_state = Arc::new(StdMutex::new(line_state));

        // Start task to process line_receiver.
        manage_shared_writer_output::spawn_task_to_monitor_line_control_channel(
            line_state_control_channel_receiver,
            safe_line_state.clone(),
            output_device.clone(),
            shutdown_complete_sender.clone(),
        );

        let readline = Readline {
            output_device,
            input_device,
            safe_line_state,
            history_sender,
            history_receiver,
            safe_history,
            settings: EditSettings::default(),
            session_state: SessionState::Idle,
            cancel_handle: CancelHandle::default(),
            shutdown_complete_sender,
        };

        // Create the shared writer.
        let shared_writer = SharedWriter::new(line_control_channel_sender);

        Ok((readline, shared_writer))
    }

    /// Change the prompt.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn update_prompt(&mut self, prompt: &str) -> Result<(), ReadlineError> {
        self.apply_and_flush(crate::Edit::SetPrompt(prompt.to_string()))
    }

    /// Clear the screen, the prompt goes to the top.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn clear(&mut self) -> Result<(), ReadlineError> {
        self.apply_and_flush(crate::Edit::ClearScreen)
    }

    #[allow(clippy::unwrap_in_result)] /* This is for lock.unwrap() */
    fn apply_and_flush(&mut self, edit: crate::Edit) -> Result<(), ReadlineError> {
        let mut line_state = self.safe_line_state.lock().unwrap();
        let mut history = self.safe_history.lock().unwrap();
        let mut ctx = EditContext::new(&mut history)
            .with_tokenizer_options(self.settings.tokenizer_options);
        let patch = line_state.apply(edit, &mut ctx)?;
        patch.flush(lock_output_device_as_mut!(self.output_device))?;
        Ok(())
    }

    /// Set maximum history length. The default length is [`crate::HISTORY_SIZE_MAX`].
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn set_max_history(&mut self, max_size: usize) {
        self.safe_history.lock().unwrap().set_max_size(max_size);
    }

    /// Set whether the input line should remain on the screen after events.
    ///
    /// If `enter` is true, then when the user presses "Enter", the prompt and the text
    /// they entered will remain on the screen, and the cursor will move to the next line.
    /// If `enter` is false, the prompt & input will be erased instead.
    /// The default value for this is `true`.
    ///
    /// `control_c` similarly controls the behavior for when the user presses `Ctrl+C`.
    /// The default value for this is `false`.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn should_print_line_on(&mut self, enter: bool, control_c: bool) {
        let mut line_state = self.safe_line_state.lock().unwrap();
        line_state.should_print_line_on_enter = enter;
        line_state.should_print_line_on_control_c = control_c;
    }

    pub fn set_completion_source(
        &mut self,
        completion_source: Option<Arc<dyn CompletionSource + Send + Sync>>,
    ) {
        self.settings.completion_source = completion_source;
    }

    /// Add a line to the input history.
    pub fn add_history_entry(&mut self, entry: String) -> Option<()> {
        self.history_sender.send(entry).ok()
    }

    /// Hand this to whoever may need to cancel a read.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle { self.cancel_handle.clone() }

    #[must_use]
    pub fn session_state(&self) -> SessionState { self.session_state }

    /// This function returns when <kbd>Ctrl+D</kbd>, <kbd>Ctrl+C</kbd>, or
    /// <kbd>Enter</kbd> is pressed with some user input, when the input runs out
    /// ([`ReadlineEvent::Eof`]), or when the read is cancelled.
    ///
    /// Note that this function can be called repeatedly in a loop. It will return each
    /// line of input as it is entered.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails, and
    /// [`ReadlineError::Closed`] when the readline loop is told to exit.
    pub async fn readline(&mut self) -> Result<ReadlineEvent, ReadlineError> {
        self.run_session(ReadMode::Line).await
    }

    /// Like [`Self::readline()`], but what is typed is painted as
    /// [`EditSettings::mask_char`]s and kept in a [`SecureBuffer`]. History and completion
    /// are off. Returns [`ReadlineEvent::Password`] on <kbd>Enter</kbd>. The prompt and
    /// line that were showing before come back afterwards.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    ///
    /// # Errors
    ///
    /// Same as [`Self::readline()`].
    #[allow(clippy::unwrap_in_result)] /* This is for lock.unwrap() */
    pub async fn read_password(
        &mut self,
        prompt: &str,
    ) -> Result<ReadlineEvent, ReadlineError> {
        // Painted when the session starts.
        _ = self
            .safe_line_state
            .lock()
            .unwrap()
            .begin_password(prompt, self.settings.mask_char);

        let result = self.run_session(ReadMode::Line).await;

        // Only left in password mode on an error.
        let patch = {
            let mut line_state = self.safe_line_state.lock().unwrap();
            if line_state.is_password_mode() {
                line_state.end_password();
                line_state.repaint(RepaintFrom::Prompt)
            } else {
                Patch::new()
            }
        };
        patch.flush(lock_output_device_as_mut!(self.output_device))?;

        result
    }

    /// Waits for one key press and returns it as [`ReadlineEvent::Key`], without
    /// touching the line.
    ///
    /// # Errors
    ///
    /// Same as [`Self::readline()`].
    pub async fn read_key(&mut self) -> Result<ReadlineEvent, ReadlineError> {
        self.run_session(ReadMode::Key).await
    }

    async fn run_session(&mut self, mode: ReadMode) -> Result<ReadlineEvent, ReadlineError> {
        self.cancel_handle.reset();
        self.session_state = SessionState::Reading;

        let result = self.poll_session(mode).await;

        self.session_state = match result {
            Ok(ReadlineEvent::Cancelled | ReadlineEvent::Interrupted) => {
                SessionState::Cancelled
            }
            _ => SessionState::Ended,
        };
        tracing::debug!(message = "reading session ended", state = ?self.session_state);
        result
    }

    /// Polling function for the reading sessions, manages all input and output.
    #[allow(clippy::unwrap_in_result)] /* This is for lock.unwrap() */
    async fn poll_session(&mut self, mode: ReadMode) -> Result<ReadlineEvent, ReadlineError> {
        let _session = ReadingSession::acquire(&self.output_device, &self.input_device)?;
        let mut shutdown_complete_receiver = self.shutdown_complete_sender.subscribe();

        if mode == ReadMode::Line {
            let patch = self
                .safe_line_state
                .lock()
                .unwrap()
                .repaint(RepaintFrom::Prompt);
            patch.flush(lock_output_device_as_mut!(self.output_device))?;
        }

        loop {
            if self.cancel_handle.is_cancelled() {
                return readline_internal::cancel_and_render(
                    &self.safe_line_state,
                    &self.safe_history,
                    &self.output_device,
                );
            }

            select! {
                // Poll for events.
                // This branch is cancel safe because no state is declared inside the
                // future in the following block.
                maybe_input_event = self.input_device.next_input_event() => {
                    let Some(input_event) = maybe_input_event else {
                        return readline_internal::end_of_input(
                            &self.safe_line_state,
                            &self.output_device,
                        );
                    };
                    let control_flow = match mode {
                        ReadMode::Line => readline_internal::apply_event_to_line_state_and_render(
                            input_event,
                            &self.safe_line_state,
                            &self.safe_history,
                            &self.output_device,
                            &self.settings,
                        ),
                        ReadMode::Key => readline_internal::key_press_from_event(input_event),
                    };
                    match control_flow {
                        ControlFlowExtended::ReturnOk(ok_value) => return Ok(ok_value),
                        ControlFlowExtended::ReturnError(err_value) => return Err(err_value),
                        ControlFlowExtended::Continue => {}
                    }
                },

                // Poll for history updates.
                // This branch is cancel safe because recv is cancel safe.
                maybe_line = self.history_receiver.recv() => {
                    self.safe_history.lock().unwrap().update(maybe_line);
                },

                // Wake up to check the cancel flag.
                () = self.cancel_handle.notified() => {},

                // Poll for shutdown signal.
                _ = shutdown_complete_receiver.recv() => {
                    return Err(ReadlineError::Closed);
                }
            }
        }
    }
}

/// Where the prompt starts. Only a real terminal is asked for its cursor position.
fn initial_anchor(
    output_device: &OutputDevice,
    input_device: &InputDevice,
    term_size: (u16, u16),
) -> TerminalPoint {
    if output_device.is_mock || input_device.kind == InputDeviceKind::Mock {
        return TerminalPoint::default();
    }
    match crossterm::cursor::position() {
        Ok((col, row)) => TerminalPoint::new(i32::from(col), i32::from(row)),
        Err(err) => {
            tracing::debug!(message = "cursor position unavailable", error = %err);
            TerminalPoint::new(0, i32::from(term_size.1) - 1)
        }
    }
}

pub mod readline_internal {
    #[allow(clippy::wildcard_imports)]
    use super::*;

    /// Runs one input event through the key bindings and flushes the resulting patch.
    /// An [`ReadlineError::InvalidOperation`] is logged and the read goes on.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn apply_event_to_line_state_and_render(
        input_event: CrosstermEventResult,
        self_safe_line_state: &SafeLineState,
        self_safe_history: &SafeHistory,
        output_device: &OutputDevice,
        settings: &EditSettings,
    ) -> ControlFlowExtended<ReadlineEvent, ReadlineError> {
        let event = match input_event {
            Ok(event) => event,
            Err(err) => return ControlFlowExtended::ReturnError(err.into()),
        };

        let mut line_state = self_safe_line_state.lock().unwrap();
        let mut history = self_safe_history.lock().unwrap();
        let mut ctx = EditContext::new(&mut history)
            .with_tokenizer_options(settings.tokenizer_options);
        if let Some(source) = settings.completion_source.as_deref() {
            ctx = ctx.with_completion_source(source);
        }

        let outcome = match line_state.handle_event(event, &settings.key_bindings, &mut ctx) {
            Ok(outcome) => outcome,
            Err(ReadlineError::InvalidOperation(message)) => {
                tracing::debug!(message = "invalid operation ignored", reason = message);
                return ControlFlowExtended::Continue;
            }
            Err(err) => return ControlFlowExtended::ReturnError(err),
        };

        let term = lock_output_device_as_mut!(output_device);
        if let Err(err) = outcome.patch.flush(term) {
            return ControlFlowExtended::ReturnError(err.into());
        }

        match outcome.event {
            Some(readline_event) => ControlFlowExtended::ReturnOk(readline_event),
            None => ControlFlowExtended::Continue,
        }
    }

    /// Key presses end a [`Readline::read_key()`], everything else is skipped.
    pub fn key_press_from_event(
        input_event: CrosstermEventResult,
    ) -> ControlFlowExtended<ReadlineEvent, ReadlineError> {
        match input_event {
            Ok(Event::Key(key_event)) if key_event.kind != KeyEventKind::Release => {
                ControlFlowExtended::ReturnOk(ReadlineEvent::Key(key_event))
            }
            Ok(_) => ControlFlowExtended::Continue,
            Err(err) => ControlFlowExtended::ReturnError(err.into()),
        }
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    #[allow(clippy::unwrap_in_result)] /* This is for lock.unwrap() */
    pub fn cancel_and_render(
        self_safe_line_state: &SafeLineState,
        self_safe_history: &SafeHistory,
        output_device: &OutputDevice,
    ) -> Result<ReadlineEvent, ReadlineError> {
        tracing::debug!(message = "reading session cancelled");
        let mut line_state = self_safe_line_state.lock().unwrap();
        self_safe_history.lock().unwrap().reset_navigation();
        let patch = line_state.cancel();
        patch.flush(lock_output_device_as_mut!(output_device))?;
        Ok(ReadlineEvent::Cancelled)
    }

    /// The input stream is exhausted (e.g. piped `stdin` hit EOF).
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    #[allow(clippy::unwrap_in_result)] /* This is for lock.unwrap() */
    pub fn end_of_input(
        self_safe_line_state: &SafeLineState,
        output_device: &OutputDevice,
    ) -> Result<ReadlineEvent, ReadlineError> {
        let (patch, event) = self_safe_line_state.lock().unwrap().end_of_file();
        patch.flush(lock_output_device_as_mut!(output_device))?;
        Ok(event)
    }
}
