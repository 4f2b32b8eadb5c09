use jobconnect_chat::{ChatHandle, PendingReply, SendRejected};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTIONS: [Suggestion; 6] = [
    Suggestion {
        id: "practice-interview",
        title: "Practice Interview Questions",
        description: "Get ready for your next interview",
        prompt: "I have an interview coming up. Can you help me practice interview questions for my target role?",
    },
    Suggestion {
        id: "find-resources",
        title: "Find Resources",
        description: "Career training and education",
        prompt: "What resources or programs support military spouses who want to grow their careers?",
    },
    Suggestion {
        id: "connect-mentors",
        title: "Connect to Mentors",
        description: "Build your professional network",
        prompt: "Can you connect me with mentors in industries that value military spouse experience?",
    },
    Suggestion {
        id: "resume-help",
        title: "Resume Help",
        description: "Improve your resume",
        prompt: "Could you review my resume and suggest improvements for roles that accommodate frequent relocations?",
    },
    Suggestion {
        id: "job-search",
        title: "Job Search",
        description: "Find opportunities",
        prompt: "I am looking for job opportunities. Please recommend roles that fit a flexible or remote lifestyle.",
    },
    Suggestion {
        id: "career-advice",
        title: "Career Advice",
        description: "Get guidance and tips",
        prompt: "I want career advice tailored for military spouses. Where should I start?",
    },
];

pub const FALLBACK_PROMPT: &str =
    "I would like support with my career journey as a military spouse.";

pub fn prompt_for(id: &str) -> &'static str {
    SUGGESTIONS
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.prompt)
        .unwrap_or(FALLBACK_PROMPT)
}

/// Zero-based index, as bound to F1..F6.
pub fn by_index(index: usize) -> Option<&'static Suggestion> {
    SUGGESTIONS.get(index)
}

pub fn dispatch(handle: &impl ChatHandle, id: &str) -> Result<PendingReply, SendRejected> {
    tracing::debug!(suggestion = id, "dispatching suggestion");
    handle.send_message(prompt_for(id))
}

pub struct SuggestionBar;

impl Widget for SuggestionBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Quick Actions - choose a topic to get started");
        let inner = block.inner(area);
        block.render(area, buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(inner);
        for (index, suggestion) in SUGGESTIONS.iter().enumerate() {
            let column = columns[index % 3];
            let row = (index / 3) as u16;
            if row >= column.height {
                continue;
            }
            let cell = Rect::new(column.x, column.y + row, column.width, 1);
            Paragraph::new(Line::from(vec![
                Span::styled(format!("F{} ", index + 1), Style::new().yellow().bold()),
                Span::styled(suggestion.title, Style::new().bold()),
                Span::styled(format!(" - {}", suggestion.description), Style::new().gray()),
            ]))
            .render(cell, buf);
        }
    }
}
