use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Spans,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum NoticeKind {
    Info,
    Warning,
    Critical,
}

/// A blocking message box; it stays up until the next key press
#[derive(Clone, PartialEq, Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, title, message)
    }

    pub fn warning(title: &str, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, title, message)
    }

    pub fn critical(title: &str, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Critical, title, message)
    }

    fn new(kind: NoticeKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

pub fn render_notice<B: Backend>(frame: &mut Frame<B>, size: Rect, notice: &Notice) {
    let popup_area = centered_rect(60, 25, size);

    let color = match notice.kind {
        NoticeKind::Info => Color::Green,
        NoticeKind::Warning => Color::Yellow,
        NoticeKind::Critical => Color::Red,
    };

    let body = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(notice.message.as_str()),
        Spans::from(""),
        Spans::from("Press any key to continue"),
    ])
    .block(Block::default().title(notice.title.as_str()).borders(Borders::ALL))
    .style(Style::default().fg(color))
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup_area);
    frame.render_widget(body, popup_area);
}

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
