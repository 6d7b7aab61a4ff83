// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

/// A key plus its modifiers, normalized so that table lookups are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    #[must_use]
    pub const fn plain(code: KeyCode) -> Self { Self::new(code, KeyModifiers::NONE) }

    #[must_use]
    pub const fn ctrl(ch: char) -> Self { Self::new(KeyCode::Char(ch), KeyModifiers::CONTROL) }

    #[must_use]
    pub const fn alt(code: KeyCode) -> Self { Self::new(code, KeyModifiers::ALT) }

    /// Returns [`None`] for key releases. Shift is dropped from chars (it is already in
    /// the char itself) and from `BackTab`, and chars typed with Ctrl are lowercased.
    #[must_use]
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mut modifiers = event.modifiers;
        let code = match event.code {
            KeyCode::Char(ch) => {
                modifiers.remove(KeyModifiers::SHIFT);
                if modifiers.contains(KeyModifiers::CONTROL) {
                    KeyCode::Char(ch.to_ascii_lowercase())
                } else {
                    KeyCode::Char(ch)
                }
            }
            KeyCode::BackTab => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            code => code,
        };
        Some(Self::new(code, modifiers))
    }

    /// The char to insert when no binding claims this chord.
    #[must_use]
    pub fn insertable_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) if self.modifiers.is_empty() && !ch.is_control() => Some(ch),
            _ => None,
        }
    }
}

/// What a bound key does to the line. The names round trip through strings, so bindings
/// can be read from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum EditAction {
    Submit,
    InsertNewline,
    Backspace,
    Delete,
    MoveLeft,
    MoveRight,
    MoveWordLeft,
    MoveWordRight,
    MoveHome,
    MoveEnd,
    HistoryPrev,
    HistoryNext,
    CompletionNext,
    CompletionPrev,
    ClearScreen,
    Interrupt,
    EndOfFile,
    DeleteToStart,
    DeleteWordBefore,
}

pub type KeyTable = HashMap<KeyChord, EditAction>;

/// Two level chord lookup. [`KeyBindings::platform_override`] is consulted first, so it
/// always wins over [`KeyBindings::base`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub base: KeyTable,
    pub platform_override: KeyTable,
}

impl Default for KeyBindings {
    fn default() -> Self { Self::platform_default() }
}

impl KeyBindings {
    #[must_use]
    pub fn platform_default() -> Self {
        let platform_override = if cfg!(target_os = "macos") {
            Self::macos_table()
        } else if cfg!(windows) {
            Self::windows_table()
        } else {
            KeyTable::new()
        };
        Self {
            base: Self::base_table(),
            platform_override,
        }
    }

    #[must_use]
    pub fn base_table() -> KeyTable {
        let mut table = KeyTable::from([
            (KeyChord::plain(KeyCode::Enter), EditAction::Submit),
            (KeyChord::alt(KeyCode::Enter), EditAction::InsertNewline),
            (KeyChord::plain(KeyCode::Backspace), EditAction::Backspace),
            (KeyChord::plain(KeyCode::Delete), EditAction::Delete),
            (KeyChord::plain(KeyCode::Left), EditAction::MoveLeft),
            (KeyChord::plain(KeyCode::Right), EditAction::MoveRight),
            (
                KeyChord::new(KeyCode::Left, KeyModifiers::CONTROL),
                EditAction::MoveWordLeft,
            ),
            (
                KeyChord::new(KeyCode::Right, KeyModifiers::CONTROL),
                EditAction::MoveWordRight,
            ),
            (KeyChord::alt(KeyCode::Char('b')), EditAction::MoveWordLeft),
            (KeyChord::alt(KeyCode::Char('f')), EditAction::MoveWordRight),
            (KeyChord::plain(KeyCode::Home), EditAction::MoveHome),
            (KeyChord::plain(KeyCode::End), EditAction::MoveEnd),
            (KeyChord::plain(KeyCode::Up), EditAction::HistoryPrev),
            (KeyChord::plain(KeyCode::Down), EditAction::HistoryNext),
            (KeyChord::plain(KeyCode::Tab), EditAction::CompletionNext),
            (KeyChord::plain(KeyCode::BackTab), EditAction::CompletionPrev),
            (KeyChord::ctrl('l'), EditAction::ClearScreen),
            (KeyChord::ctrl('c'), EditAction::Interrupt),
            (KeyChord::ctrl('d'), EditAction::EndOfFile),
            (KeyChord::ctrl('u'), EditAction::DeleteToStart),
            (KeyChord::ctrl('w'), EditAction::DeleteWordBefore),
        ]);
        if cfg!(feature = "emacs") {
            table.extend([
                (KeyChord::ctrl('a'), EditAction::MoveHome),
                (KeyChord::ctrl('e'), EditAction::MoveEnd),
            ]);
        }
        table
    }

    /// Option+arrows move by word, Option+Backspace deletes a word.
    #[must_use]
    pub fn macos_table() -> KeyTable {
        KeyTable::from([
            (KeyChord::alt(KeyCode::Left), EditAction::MoveWordLeft),
            (KeyChord::alt(KeyCode::Right), EditAction::MoveWordRight),
            (KeyChord::alt(KeyCode::Backspace), EditAction::DeleteWordBefore),
        ])
    }

    #[must_use]
    pub fn windows_table() -> KeyTable {
        KeyTable::from([(
            KeyChord::new(KeyCode::Backspace, KeyModifiers::CONTROL),
            EditAction::DeleteWordBefore,
        )])
    }

    /// Add a binding that wins over everything already bound.
    #[must_use]
    pub fn with_binding(mut self, chord: KeyChord, action: EditAction) -> Self {
        self.platform_override.insert(chord, action);
        self
    }

    #[must_use]
    pub fn lookup(&self, chord: &KeyChord) -> Option<EditAction> {
        self.platform_override
            .get(chord)
            .or_else(|| self.base.get(chord))
            .copied()
    }
}
