use jobconnect_chat::message::format_time;
use jobconnect_chat::{Message, Role};
use ratatui::{
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TYPING_FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];

pub fn role_label(role: Role) -> Span<'static> {
    match role {
        Role::Bot => Span::styled("Assistant", Style::new().fg(Color::Cyan).bold()),
        Role::User => Span::styled("You", Style::new().fg(Color::Green).bold()),
        Role::System => Span::styled("System", Style::new().fg(Color::Magenta).bold()),
    }
}

/// Header line, wrapped content and an optional sources footnote.
pub fn message_as_text(message: &Message, width: usize) -> Text<'static> {
    let mut lines = vec![Line::from(vec![
        role_label(message.role),
        Span::raw("  "),
        Span::styled(format_time(&message.timestamp), Style::new().gray()),
    ])];
    for line in message.content.lines() {
        for chunk in wrap_line(line, width) {
            lines.push(Line::from(chunk));
        }
    }
    if !message.sources.is_empty() {
        let sources = format!("Sources: {}", message.sources.join(", "));
        for chunk in wrap_line(&sources, width) {
            lines.push(Line::from(Span::styled(chunk, Style::new().dark_gray().italic())));
        }
    }
    lines.push(Line::default());
    Text::from(lines)
}

pub fn typing_indicator(tick: u64) -> Text<'static> {
    let frame = TYPING_FRAMES[(tick / 8) as usize % TYPING_FRAMES.len()];
    Text::from(vec![Line::from(vec![
        role_label(Role::Bot),
        Span::raw("  "),
        Span::styled(format!("typing{frame}"), Style::new().gray().italic()),
    ])])
}

/// Greedy word wrap on terminal display width. Words wider than `width` are
/// split between characters.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let word_width = word.width();
        if !current.is_empty() && current.width() + 1 + word_width > width {
            out.push(std::mem::take(&mut current));
        }
        if word_width > width {
            for c in word.chars() {
                let char_width = c.width().unwrap_or(0);
                if !current.is_empty() && current.width() + char_width > width {
                    out.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}
