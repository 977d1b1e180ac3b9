// hardware/keyboard.rs

// Terminal keyboard input. The terminal is switched to raw mode so single key
// presses arrive without Enter, and each poll checks for a pending event with a
// zero timeout so a tick never waits on the operator.

// Dependencies
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::warn;
use std::time::Duration;

use super::{InputSource, Key};
use crate::CrawlerError;

/// Raw-mode keyboard reader; restores the terminal when dropped
pub struct KeyboardInput {
    _private: (),
}

impl KeyboardInput {
    /// Puts the terminal into raw mode
    pub fn new() -> Result<Self, CrawlerError> {
        terminal::enable_raw_mode()?;
        Ok(KeyboardInput { _private: () })
    }
}

impl Drop for KeyboardInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self) -> Option<Key> {
        match event::poll(Duration::ZERO) {
            Ok(true) => (),
            Ok(false) => return None,
            Err(e) => {
                warn!("Keyboard poll failed: {}", e);
                return None;
            }
        }

        match event::read() {
            Ok(Event::Key(KeyEvent {
                code: KeyCode::Char(c),
                modifiers,
                kind,
                ..
            })) if kind != KeyEventKind::Release => {
                if modifiers.contains(KeyModifiers::CONTROL) && c == 'c' {
                    Some(Key::Interrupt)
                } else {
                    Some(Key::Char(c))
                }
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Keyboard read failed: {}", e);
                None
            }
        }
    }
}
