use crate::App;
use crate::header::Header;
use crate::suggestions::SuggestionBar;
use crate::transcript::TranscriptView;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{StatefulWidget, Widget},
};

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Min(8),
            ])
            .split(area);

        Header::new(self.endpoint.as_deref()).render(chunks[0], buf);
        SuggestionBar.render(chunks[1], buf);

        let session = self.view.borrow();
        let view = TranscriptView::new(session.messages(), session.is_pending(), &self.input)
            .error(self.error.as_deref(), self.failed_prompt.is_some())
            .tick(self.tick);
        view.render(chunks[2], buf, &mut self.scroll);
    }
}
