use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use std::io::{self, Write};

/// Lets Shift+Enter arrive with its modifier instead of as a bare `\r`.
pub const KEYBOARD_FLAGS: KeyboardEnhancementFlags =
    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES;

/// Terminal modes layered on top of `ratatui::init`. Must be restored
/// before `ratatui::restore`.
#[derive(Debug, Default)]
pub struct TerminalModes {
    keyboard_enhanced: bool,
}

impl TerminalModes {
    /// Enables bracketed paste, and keyboard enhancement where the terminal
    /// supports it. Needs raw mode for the support query.
    pub fn enable(out: &mut impl Write) -> io::Result<Self> {
        let supported = supports_keyboard_enhancement().unwrap_or(false);
        Self::enable_with(out, supported)
    }

    pub fn enable_with(out: &mut impl Write, keyboard_enhanced: bool) -> io::Result<Self> {
        execute!(out, EnableBracketedPaste)?;
        if keyboard_enhanced {
            execute!(out, PushKeyboardEnhancementFlags(KEYBOARD_FLAGS))?;
        }
        tracing::debug!(keyboard_enhanced, "terminal modes enabled");
        Ok(Self { keyboard_enhanced })
    }

    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn restore(&self, out: &mut impl Write) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(out, PopKeyboardEnhancementFlags)?;
        }
        execute!(out, DisableBracketedPaste)
    }
}
