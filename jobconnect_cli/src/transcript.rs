use crate::input::InputBox;
use crate::widgets::{message_as_text, typing_indicator};
use jobconnect_chat::Message;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};

const PAGE: usize = 10;
const MAX_INPUT_ROWS: u16 = 6;

/// Scroll position of the transcript. Follows the newest entry until the
/// user scrolls away from the bottom.
#[derive(Debug, Clone)]
pub struct ScrollState {
    pub list: ListState,
    pub auto_scroll: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            list: ListState::default(),
            auto_scroll: true,
        }
    }
}

impl ScrollState {
    pub fn up(&mut self, rows: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.auto_scroll = false;
        let current = self.list.selected().unwrap_or(len - 1);
        self.list.select(Some(current.saturating_sub(rows)));
    }

    pub fn down(&mut self, rows: usize, len: usize) {
        if len == 0 {
            return;
        }
        let current = self.list.selected().unwrap_or(0);
        let next = (current + rows).min(len - 1);
        self.list.select(Some(next));
        if next == len - 1 {
            self.auto_scroll = true;
        }
    }

    pub fn page_up(&mut self, len: usize) {
        self.up(PAGE, len);
    }

    pub fn page_down(&mut self, len: usize) {
        self.down(PAGE, len);
    }

    pub fn home(&mut self, len: usize) {
        if len > 0 {
            self.auto_scroll = false;
            self.list.select(Some(0));
        }
    }

    pub fn end(&mut self, len: usize) {
        self.auto_scroll = true;
        if len > 0 {
            self.list.select(Some(len - 1));
        }
    }
}

/// Renders the message log, the typing indicator, the input box and the
/// footer (character counter, error and retry hint).
pub struct TranscriptView<'a> {
    messages: &'a [Message],
    pending: bool,
    input: &'a InputBox,
    error: Option<&'a str>,
    retry: bool,
    tick: u64,
}

impl<'a> TranscriptView<'a> {
    pub fn new(messages: &'a [Message], pending: bool, input: &'a InputBox) -> Self {
        Self {
            messages,
            pending,
            input,
            error: None,
            retry: false,
            tick: 0,
        }
    }

    pub fn error(mut self, error: Option<&'a str>, retry: bool) -> Self {
        self.error = error;
        self.retry = retry;
        self
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    /// Number of rows in the scrollable list, including the typing indicator.
    pub fn item_count(messages: &[Message], pending: bool) -> usize {
        messages.len() + usize::from(pending)
    }

    fn draw_messages(&self, area: Rect, buf: &mut Buffer, scroll: &mut ScrollState) {
        let width = area.width.saturating_sub(2).max(1) as usize;
        let mut items: Vec<ListItem> = self
            .messages
            .iter()
            .map(|message| ListItem::new(message_as_text(message, width)))
            .collect();
        if self.pending {
            items.push(ListItem::new(typing_indicator(self.tick)));
        }

        if scroll.auto_scroll {
            scroll.list.select(items.len().checked_sub(1));
        }

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Chat"));
        StatefulWidget::render(list, area, buf, &mut scroll.list);
    }

    fn draw_input(&self, area: Rect, buf: &mut Buffer) {
        let hint = Line::from(vec![
            Span::raw("Message "),
            Span::styled(
                "(Enter to send, Shift+Enter or Alt+Enter for newline)",
                if self.input.can_submit() {
                    Style::new().fg(Color::Green)
                } else {
                    Style::new().dark_gray()
                },
            ),
        ]);
        let block = Block::default().borders(Borders::ALL).title(hint);
        let paragraph = if self.input.value().is_empty() {
            Paragraph::new(Span::styled(
                self.input.placeholder().to_owned(),
                Style::new().dark_gray().italic(),
            ))
        } else {
            Paragraph::new(self.input.value().to_owned()).wrap(Wrap { trim: false })
        };
        let paragraph = if self.input.is_disabled() {
            paragraph.style(Style::new().dark_gray())
        } else {
            paragraph
        };
        paragraph.block(block).render(area, buf);
    }

    fn draw_footer(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        if let Some(error) = self.error {
            spans.push(Span::styled(format!("! {error}"), Style::new().red()));
            if self.retry {
                spans.push(Span::styled("  [Ctrl+R] Retry", Style::new().yellow().bold()));
            }
        }
        let counter = self.input.counter();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(counter.len() as u16)])
            .split(area);
        Paragraph::new(Line::from(spans)).render(chunks[0], buf);
        Paragraph::new(Span::styled(counter, Style::new().gray()))
            .right_aligned()
            .render(chunks[1], buf);
    }

    fn input_rows(&self) -> u16 {
        let value = self.input.value();
        let lines = u16::try_from(value.lines().count().max(1)).unwrap_or(u16::MAX);
        lines
            .saturating_add(u16::from(value.ends_with('\n')))
            .saturating_add(2)
            .min(MAX_INPUT_ROWS)
    }
}

impl StatefulWidget for TranscriptView<'_> {
    type State = ScrollState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(self.input_rows()),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_messages(chunks[0], buf, state);
        self.draw_input(chunks[1], buf);
        self.draw_footer(chunks[2], buf);
    }
}
