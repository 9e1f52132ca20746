use chrono::{Datelike, Duration, Months, NaiveDate};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::components::notice::centered_rect;

const WEEKDAYS: &str = "Mo Tu We Th Fr Sa Su";

/// Date field with a calendar popup.
///
/// `cursor` is the day highlighted in the open calendar; it only becomes
/// `date` when the popup is confirmed.
pub struct DatePickerState {
    pub date: NaiveDate,
    pub popup_open: bool,
    pub cursor: NaiveDate,
}

impl DatePickerState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            popup_open: false,
            cursor: date,
        }
    }

    pub fn set(&mut self, date: NaiveDate) {
        self.date = date;
        self.cursor = date;
        self.popup_open = false;
    }

    pub fn open_popup(&mut self) {
        self.popup_open = true;
        self.cursor = self.date;
    }

    pub fn handle_popup_key(&mut self, key: KeyCode) {
        if !self.popup_open {
            return;
        }

        match key {
            KeyCode::Left => self.shift_days(-1),
            KeyCode::Right => self.shift_days(1),
            KeyCode::Up => self.shift_days(-7),
            KeyCode::Down => self.shift_days(7),
            KeyCode::PageUp => {
                if let Some(date) = self.cursor.checked_sub_months(Months::new(1)) {
                    self.cursor = date;
                }
            }
            KeyCode::PageDown => {
                if let Some(date) = self.cursor.checked_add_months(Months::new(1)) {
                    self.cursor = date;
                }
            }
            KeyCode::Enter => {
                self.date = self.cursor;
                self.popup_open = false;
            }
            KeyCode::Esc => {
                self.cursor = self.date;
                self.popup_open = false;
            }
            _ => {}
        }
    }

    fn shift_days(&mut self, days: i64) {
        if let Some(date) = self.cursor.checked_add_signed(Duration::days(days)) {
            self.cursor = date;
        }
    }

    pub fn get_display_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

// Number of days in the month containing `date`
fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

/// Lines of the month grid around `cursor`, Monday first
fn calendar_lines(cursor: NaiveDate) -> Vec<Spans<'static>> {
    let mut lines = vec![
        Spans::from(Span::styled(
            cursor.format("%B %Y").to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from(Span::styled(WEEKDAYS, Style::default().fg(Color::Yellow))),
    ];

    let first = cursor.with_day(1).unwrap_or(cursor);
    let offset = first.weekday().num_days_from_monday() as usize;
    let mut week: Vec<Span<'static>> = vec![Span::raw("   "); offset];

    for day in 1..=days_in_month(cursor) {
        let text = format!("{:>2} ", day);
        let span = if day == cursor.day() {
            Span::styled(text, Style::default().bg(Color::Blue).fg(Color::White))
        } else {
            Span::raw(text)
        };
        week.push(span);

        if week.len() == 7 {
            lines.push(Spans::from(std::mem::take(&mut week)));
        }
    }
    if !week.is_empty() {
        lines.push(Spans::from(week));
    }

    lines
}

pub fn render_calendar<B: Backend>(frame: &mut Frame<B>, state: &DatePickerState, size: Rect) {
    let area = centered_rect(40, 50, size);

    let mut lines = calendar_lines(state.cursor);
    lines.push(Spans::from(""));
    lines.push(Spans::from("Arrows - Day | PgUp/PgDn - Month"));
    lines.push(Spans::from("Enter - Pick | Esc - Cancel"));

    let calendar = Paragraph::new(lines).block(Block::default().title("Pick a date").borders(Borders::ALL));

    frame.render_widget(Clear, area);
    frame.render_widget(calendar, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn arrows_move_the_cursor_not_the_date() {
        let mut picker = DatePickerState::new(ymd(2024, 2, 28));
        picker.open_popup();
        picker.handle_popup_key(KeyCode::Right);
        picker.handle_popup_key(KeyCode::Right);

        assert_eq!(picker.cursor, ymd(2024, 3, 1));
        assert_eq!(picker.date, ymd(2024, 2, 28));

        picker.handle_popup_key(KeyCode::Up);
        assert_eq!(picker.cursor, ymd(2024, 2, 23));
    }

    #[test]
    fn enter_confirms_and_escape_discards() {
        let mut picker = DatePickerState::new(ymd(2024, 1, 10));
        picker.open_popup();
        picker.handle_popup_key(KeyCode::Down);
        picker.handle_popup_key(KeyCode::Enter);
        assert_eq!(picker.date, ymd(2024, 1, 17));
        assert!(!picker.popup_open);

        picker.open_popup();
        picker.handle_popup_key(KeyCode::Left);
        picker.handle_popup_key(KeyCode::Esc);
        assert_eq!(picker.date, ymd(2024, 1, 17));
        assert_eq!(picker.get_display_string(), "2024-01-17");
    }

    #[test]
    fn month_paging_clamps_to_month_end() {
        let mut picker = DatePickerState::new(ymd(2024, 1, 31));
        picker.open_popup();
        picker.handle_popup_key(KeyCode::PageDown);
        assert_eq!(picker.cursor, ymd(2024, 2, 29));

        picker.handle_popup_key(KeyCode::PageUp);
        assert_eq!(picker.cursor, ymd(2024, 1, 29));
    }

    #[test]
    fn keys_are_ignored_while_closed() {
        let mut picker = DatePickerState::new(ymd(2024, 1, 31));
        picker.handle_popup_key(KeyCode::Right);
        assert_eq!(picker.cursor, ymd(2024, 1, 31));
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(ymd(2024, 2, 10)), 29);
        assert_eq!(days_in_month(ymd(2023, 2, 10)), 28);
        assert_eq!(days_in_month(ymd(2023, 12, 31)), 31);
    }

    #[test]
    fn calendar_starts_on_the_right_weekday() {
        // 2024-05-01 is a Wednesday
        let lines = calendar_lines(ymd(2024, 5, 15));
        let first_week: String = lines[2].0.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(first_week, "       1  2  3  4  5 ");
        assert_eq!(lines.len(), 2 + 5);
    }
}
