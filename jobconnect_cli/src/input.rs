use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const DEFAULT_MAX_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Idle,
    Composing,
    Submitting,
}

/// Text entry for the chat panel.
///
/// Moves `Idle -> Composing -> Submitting -> Idle`. Submitting clears the
/// buffer right away, whatever happens to the request afterwards.
#[derive(Debug, Clone)]
pub struct InputBox {
    buffer: String,
    state: InputState,
    max_length: usize,
    disabled: bool,
    placeholder: String,
}

impl InputBox {
    pub fn new(placeholder: impl Into<String>, max_length: usize) -> Self {
        Self {
            buffer: String::new(),
            state: InputState::Idle,
            max_length,
            disabled: false,
            placeholder: placeholder.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn counter(&self) -> String {
        format!("{}/{}", self.char_count(), self.max_length)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn can_submit(&self) -> bool {
        !self.disabled && !self.buffer.trim().is_empty()
    }

    /// Returns false when the character would exceed the length limit.
    pub fn insert(&mut self, c: char) -> bool {
        if self.disabled || self.char_count() >= self.max_length {
            return false;
        }
        self.buffer.push(c);
        self.state = InputState::Composing;
        true
    }

    /// Inserts as much of `text` as fits under the length limit.
    pub fn insert_str(&mut self, text: &str) {
        if self.disabled {
            return;
        }
        let room = self.max_length.saturating_sub(self.char_count());
        let before = self.buffer.len();
        self.buffer.extend(text.chars().take(room));
        if self.buffer.len() > before {
            self.state = InputState::Composing;
        }
    }

    pub fn erase(&mut self) {
        if self.disabled {
            return;
        }
        self.buffer.pop();
        if self.buffer.is_empty() {
            self.state = InputState::Idle;
        }
    }

    /// Takes the trimmed text and clears the buffer, or does nothing if
    /// submission is blocked.
    pub fn submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        let text = self.buffer.trim().to_owned();
        self.buffer.clear();
        self.state = InputState::Submitting;
        Some(text)
    }

    /// Called once the submitted text has been handed off.
    pub fn finish_submit(&mut self) {
        if self.state == InputState::Submitting {
            self.state = InputState::Idle;
        }
    }

    /// Plain Enter submits. Shift+Enter adds a line break, and so does
    /// Alt+Enter for terminals that cannot report Shift on Enter.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        match key.code {
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                self.insert('\n');
                None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.erase();
                None
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert(c);
                None
            }
            _ => None,
        }
    }
}
