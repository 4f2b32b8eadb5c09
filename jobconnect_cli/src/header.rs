use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub const TITLE: &str = "Military Spouse Job Connect";
pub const TAGLINE: &str = "Your AI-powered career companion";

pub struct Header<'a> {
    endpoint: Option<&'a str>,
}

impl<'a> Header<'a> {
    pub fn new(endpoint: Option<&'a str>) -> Self {
        Self { endpoint }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let status = match self.endpoint {
            Some(url) => Span::styled(format!("connected to {url}"), Style::new().gray()),
            None => Span::styled("offline", Style::new().red()),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title_bottom(
                Line::from("Ctrl+L reset | Ctrl+R retry | Ctrl+C quit").alignment(Alignment::Right),
            );
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled(TITLE, Style::new().fg(Color::Cyan).bold()),
                Span::raw("  "),
                status,
            ]),
            Line::from(Span::styled(TAGLINE, Style::new().italic())),
        ])
        .block(block)
        .render(area, buf);
    }
}
