use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{error, info, warn};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::db::Database;
use crate::error::{ReadError, SaveError};
use crate::models::{validate_invoice, LineItemRow};
use crate::ui::components::date_picker::{render_calendar, DatePickerState};
use crate::ui::components::items_grid::{render_items_grid, ItemsGridState};
use crate::ui::components::notice::{render_notice, Notice};

// Represents a focusable field of the form
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FormField {
    Customer,
    Date,
    Items,
}

/// Everything shown on the invoice screen
pub struct InvoiceFormState {
    customer_name: String,
    date_picker: DatePickerState,
    grid: ItemsGridState,
    current_field: FormField,
    notice: Option<Notice>,
}

// Actions that need the database; grid edits are handled in place
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InvoiceFormAction {
    Save,
    LoadLast,
    Quit,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Default for InvoiceFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceFormState {
    pub fn new() -> Self {
        Self {
            customer_name: String::new(),
            date_picker: DatePickerState::new(today()),
            grid: ItemsGridState::new(),
            current_field: FormField::Customer,
            notice: None,
        }
    }

    #[cfg(test)]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn set_customer_name(&mut self, name: &str) {
        self.customer_name = name.to_string();
    }

    pub fn date(&self) -> NaiveDate {
        self.date_picker.date
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date_picker.set(date);
    }

    #[cfg(test)]
    pub fn grid(&self) -> &ItemsGridState {
        &self.grid
    }

    #[cfg(test)]
    pub fn grid_mut(&mut self) -> &mut ItemsGridState {
        &mut self.grid
    }

    pub fn rows(&self) -> &[LineItemRow] {
        self.grid.rows()
    }

    #[cfg(test)]
    pub fn current_field(&self) -> FormField {
        self.current_field
    }

    #[cfg(test)]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Back to a blank invoice: no customer, today's date, no rows
    pub fn reset(&mut self) {
        self.customer_name.clear();
        self.date_picker.set(today());
        self.grid.clear();
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            FormField::Customer => FormField::Date,
            FormField::Date => FormField::Items,
            FormField::Items => FormField::Customer,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            FormField::Customer => FormField::Items,
            FormField::Date => FormField::Customer,
            FormField::Items => FormField::Date,
        };
    }
}

/// Validate the form and write it as one invoice.
///
/// Every outcome is also reported to the user through a notice. On success
/// the form is reset for the next invoice.
pub async fn save_invoice(db: &Database, state: &mut InvoiceFormState) -> Result<i64, SaveError> {
    let outcome = match validate_invoice(&state.customer_name, state.date(), state.rows()) {
        Ok(invoice) => db.save_invoice(&invoice).await.map_err(SaveError::from),
        Err(err) => Err(SaveError::from(err)),
    };

    match &outcome {
        Ok(id) => {
            info!("invoice {} saved from form", id);
            state.reset();
            state.show_notice(Notice::info("Success", "Invoice saved successfully!"));
        }
        Err(SaveError::Validation(err)) => {
            warn!("invoice rejected: {}", err);
            state.show_notice(Notice::warning("Input Error", err.to_string()));
        }
        Err(SaveError::Persistence(err)) => {
            error!("invoice not saved: {}", err);
            state.show_notice(Notice::critical("Database Error", err.to_string()));
        }
    }

    outcome
}

/// Replace the form contents with the most recently saved invoice.
///
/// With no invoice stored the form is reset. A failing query is reported
/// and whatever was already applied to the form stays there.
pub async fn load_last_invoice(db: &Database, state: &mut InvoiceFormState) -> Result<(), ReadError> {
    let outcome = populate_from_latest(db, state).await;

    if let Err(err) = &outcome {
        error!("{}", err);
        state.show_notice(Notice::critical("Database Error", err.to_string()));
    }

    outcome
}

async fn populate_from_latest(db: &Database, state: &mut InvoiceFormState) -> Result<(), ReadError> {
    let Some(invoice) = db.latest_invoice().await? else {
        state.reset();
        return Ok(());
    };

    state.set_customer_name(&invoice.customer_name);
    state.set_date(invoice.date);
    state.grid.clear();

    let items = db.items_for_invoice(invoice.id).await?;
    for item in &items {
        state.grid.push_row(LineItemRow::from(item));
    }

    info!("loaded invoice {} with {} items", invoice.id, items.len());
    Ok(())
}

pub fn render_invoice_form<B: Backend>(frame: &mut Frame<B>, state: &mut InvoiceFormState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3), // Title
                Constraint::Length(3), // Customer
                Constraint::Length(3), // Date
                Constraint::Min(6),    // Items
                Constraint::Length(3), // Help
            ]
            .as_ref(),
        )
        .split(size);

    let title = Paragraph::new("Snack Shop Invoice")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    render_text_field(
        frame,
        chunks[1],
        "Customer: ",
        format!(
            "{}{}",
            state.customer_name,
            if state.current_field == FormField::Customer { "|" } else { "" }
        ),
        state.current_field == FormField::Customer,
    );
    render_text_field(
        frame,
        chunks[2],
        "Date: ",
        state.date_picker.get_display_string(),
        state.current_field == FormField::Date,
    );

    let items_focused = state.current_field == FormField::Items;
    render_items_grid(frame, &mut state.grid, chunks[3], items_focused);

    let help_text = match state.current_field {
        _ if state.grid.is_editing() => "Enter - Save cell | Esc - Cancel editing",
        FormField::Customer => "Tab - Next field | Ctrl+N - Add item | Ctrl+S - Save | Ctrl+L - Load last | Ctrl+Q - Quit",
        FormField::Date => "Enter - Open calendar | Tab - Next field | Ctrl+S - Save | Ctrl+L - Load last | Ctrl+Q - Quit",
        FormField::Items => {
            "Ins - Add | Del - Remove selected | Space - Select | Enter - Edit | Ctrl+S - Save | Ctrl+L - Load last"
        }
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[4]);

    if state.date_picker.popup_open {
        render_calendar(frame, &state.date_picker, size);
    }

    if let Some(notice) = &state.notice {
        render_notice(frame, size, notice);
    }
}

fn render_text_field<B: Backend>(frame: &mut Frame<B>, area: Rect, label: &str, value: String, focused: bool) {
    let label_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let field = Paragraph::new(Spans::from(vec![
        Span::styled(label.to_string(), label_style),
        Span::raw(value),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(field, area);
}

/// Apply one key press to the form, returning the action it triggers, if any
pub fn handle_key(state: &mut InvoiceFormState, key: KeyEvent) -> Option<InvoiceFormAction> {
    // Any key closes a notice, and does nothing else
    if state.notice.is_some() {
        state.dismiss_notice();
        return None;
    }

    if state.date_picker.popup_open {
        state.date_picker.handle_popup_key(key.code);
        return None;
    }

    // Ctrl/Alt chords are never cell text: keep what was typed, then dispatch
    if state.grid.is_editing() && key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        state.grid.commit_edit();
    } else if state.grid.is_editing() {
        match key.code {
            KeyCode::Enter => state.grid.commit_edit(),
            KeyCode::Esc => state.grid.cancel_edit(),
            KeyCode::Tab => {
                state.grid.commit_edit();
                state.grid.next_column();
            }
            code => state.grid.edit_input(code),
        }
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('s') => return Some(InvoiceFormAction::Save),
            KeyCode::Char('l') => return Some(InvoiceFormAction::LoadLast),
            KeyCode::Char('q') => return Some(InvoiceFormAction::Quit),
            KeyCode::Char('n') => state.grid.add_row(),
            KeyCode::Char('d') => state.grid.remove_selected(),
            _ => {}
        }
        return None;
    }

    if key.modifiers.contains(KeyModifiers::ALT) {
        return None;
    }

    match (state.current_field, key.code) {
        (_, KeyCode::Tab) => state.next_field(),
        (_, KeyCode::BackTab) => state.previous_field(),
        (FormField::Customer, KeyCode::Char(c)) => state.customer_name.push(c),
        (FormField::Customer, KeyCode::Backspace) => {
            state.customer_name.pop();
        }
        (FormField::Date, KeyCode::Enter | KeyCode::Char(' ')) => state.date_picker.open_popup(),
        (FormField::Items, KeyCode::Insert) => state.grid.add_row(),
        (FormField::Items, KeyCode::Delete) => state.grid.remove_selected(),
        (FormField::Items, KeyCode::Esc) => state.grid.clear_selection(),
        (FormField::Items, KeyCode::Up) if key.modifiers.contains(KeyModifiers::SHIFT) => {
            state.grid.extend_selection(false)
        }
        (FormField::Items, KeyCode::Down) if key.modifiers.contains(KeyModifiers::SHIFT) => {
            state.grid.extend_selection(true)
        }
        (FormField::Items, KeyCode::Up) => state.grid.previous_row(),
        (FormField::Items, KeyCode::Down) => state.grid.next_row(),
        (FormField::Items, KeyCode::Left) => state.grid.previous_column(),
        (FormField::Items, KeyCode::Right) => state.grid.next_column(),
        (FormField::Items, KeyCode::Char(' ')) => state.grid.toggle_cursor_row(),
        (FormField::Items, KeyCode::Enter) => state.grid.begin_edit(None),
        (FormField::Items, KeyCode::Char(c)) => state.grid.begin_edit(Some(c)),
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut InvoiceFormState) -> Result<Option<InvoiceFormAction>> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            return Ok(handle_key(state, key));
        }
    }

    Ok(None)
}
