use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::models::LineItemRow;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GridColumn {
    Name,
    Quantity,
    Price,
}

impl GridColumn {
    fn next(self) -> Self {
        match self {
            GridColumn::Name => GridColumn::Quantity,
            GridColumn::Quantity => GridColumn::Price,
            GridColumn::Price => GridColumn::Name,
        }
    }

    fn previous(self) -> Self {
        match self {
            GridColumn::Name => GridColumn::Price,
            GridColumn::Quantity => GridColumn::Name,
            GridColumn::Price => GridColumn::Quantity,
        }
    }
}

/// Inclusive block of selected rows
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SelectionRange {
    pub top: usize,
    pub bottom: usize,
}

impl SelectionRange {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            top: a.min(b),
            bottom: a.max(b),
        }
    }

    fn contains(&self, row: usize) -> bool {
        self.top <= row && row <= self.bottom
    }
}

/// The editable line-item table.
///
/// `selection` is kept sorted by `top` with no overlapping or touching ranges.
pub struct ItemsGridState {
    rows: Vec<LineItemRow>,
    table_state: TableState,
    column: GridColumn,
    selection: Vec<SelectionRange>,
    editing: Option<String>,
}

impl Default for ItemsGridState {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemsGridState {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            table_state: TableState::default(),
            column: GridColumn::Name,
            selection: Vec::new(),
            editing: None,
        }
    }

    pub fn rows(&self) -> &[LineItemRow] {
        &self.rows
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn cursor(&self) -> Option<usize> {
        self.table_state.selected()
    }

    #[cfg(test)]
    pub fn selection(&self) -> &[SelectionRange] {
        &self.selection
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Append a row with the default cell values and move the cursor onto it
    pub fn add_row(&mut self) {
        self.rows.push(LineItemRow::default());
        self.table_state.select(Some(self.rows.len() - 1));
    }

    pub fn push_row(&mut self, row: LineItemRow) {
        self.rows.push(row);
        if self.table_state.selected().is_none() {
            self.table_state.select(Some(0));
        }
    }

    /// Drop every row and any selection or edit in progress
    pub fn clear(&mut self) {
        self.rows.clear();
        self.selection.clear();
        self.editing = None;
        self.table_state.select(None);
        self.column = GridColumn::Name;
    }

    /// Remove every selected row; with nothing selected this is a no-op.
    ///
    /// Ranges are removed highest index first and each range bottom row first,
    /// so no pending index is shifted by an earlier removal.
    pub fn remove_selected(&mut self) {
        if self.selection.is_empty() {
            return;
        }

        let mut ranges = self.selection.clone();
        ranges.sort_by(|a, b| b.top.cmp(&a.top));

        for range in ranges {
            for row in (range.top..=range.bottom).rev() {
                if row < self.rows.len() {
                    self.rows.remove(row);
                }
            }
        }

        self.selection.clear();
        self.editing = None;

        // Adjust cursor after deletion
        let cursor = match self.table_state.selected() {
            _ if self.rows.is_empty() => None,
            Some(row) if row >= self.rows.len() => Some(self.rows.len() - 1),
            other => other,
        };
        self.table_state.select(cursor);
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.selection.iter().any(|range| range.contains(row))
    }

    /// Add a range to the selection, merging it with its neighbours
    pub fn select_range(&mut self, range: SelectionRange) {
        self.selection.push(range);
        self.selection.sort_by_key(|r| r.top);

        let mut merged: Vec<SelectionRange> = Vec::with_capacity(self.selection.len());
        for range in self.selection.drain(..) {
            match merged.last_mut() {
                Some(last) if range.top <= last.bottom + 1 => {
                    last.bottom = last.bottom.max(range.bottom);
                }
                _ => merged.push(range),
            }
        }
        self.selection = merged;
    }

    pub fn toggle_row(&mut self, row: usize) {
        if row >= self.rows.len() {
            return;
        }

        if !self.is_selected(row) {
            self.select_range(SelectionRange::new(row, row));
            return;
        }

        let mut split = Vec::with_capacity(self.selection.len() + 1);
        for range in self.selection.drain(..) {
            if !range.contains(row) {
                split.push(range);
                continue;
            }
            if range.top < row {
                split.push(SelectionRange::new(range.top, row - 1));
            }
            if row < range.bottom {
                split.push(SelectionRange::new(row + 1, range.bottom));
            }
        }
        self.selection = split;
    }

    pub fn toggle_cursor_row(&mut self) {
        if let Some(row) = self.table_state.selected() {
            self.toggle_row(row);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn next_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= self.rows.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.rows.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    /// Shift+Up/Down: move without wrapping and select both rows passed over
    pub fn extend_selection(&mut self, down: bool) {
        let Some(from) = self.table_state.selected() else {
            return;
        };
        let to = if down {
            (from + 1).min(self.rows.len().saturating_sub(1))
        } else {
            from.saturating_sub(1)
        };
        self.select_range(SelectionRange::new(from, to));
        self.table_state.select(Some(to));
    }

    pub fn next_column(&mut self) {
        self.column = self.column.next();
    }

    pub fn previous_column(&mut self) {
        self.column = self.column.previous();
    }

    /// Open the in-place editor on the cursor cell.
    ///
    /// A typed character replaces the cell text; `None` keeps it for editing.
    pub fn begin_edit(&mut self, first: Option<char>) {
        let Some(row) = self.table_state.selected() else {
            return;
        };
        let Some(current) = self.rows.get(row) else {
            return;
        };
        self.editing = Some(match first {
            Some(c) => c.to_string(),
            None => cell(current, self.column).to_string(),
        });
    }

    pub fn edit_input(&mut self, key: KeyCode) {
        if let Some(value) = &mut self.editing {
            match key {
                KeyCode::Char(c) => value.push(c),
                KeyCode::Backspace => {
                    value.pop();
                }
                _ => {}
            }
        }
    }

    pub fn commit_edit(&mut self) {
        let (Some(value), Some(row)) = (self.editing.take(), self.table_state.selected()) else {
            return;
        };
        if let Some(target) = self.rows.get_mut(row) {
            *cell_mut(target, self.column) = value;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Sum of quantity * price over rows whose cells parse
    pub fn total(&self) -> f64 {
        self.rows.iter().filter_map(LineItemRow::amount).sum()
    }
}

fn cell(row: &LineItemRow, column: GridColumn) -> &str {
    match column {
        GridColumn::Name => &row.name,
        GridColumn::Quantity => &row.quantity,
        GridColumn::Price => &row.price,
    }
}

fn cell_mut(row: &mut LineItemRow, column: GridColumn) -> &mut String {
    match column {
        GridColumn::Name => &mut row.name,
        GridColumn::Quantity => &mut row.quantity,
        GridColumn::Price => &mut row.price,
    }
}

pub fn render_items_grid<B: Backend>(frame: &mut Frame<B>, state: &mut ItemsGridState, area: Rect, focused: bool) {
    let header_cells = ["Item Name", "Quantity", "Price"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let cursor = state.table_state.selected();
    let rows = state.rows.iter().enumerate().map(|(index, row)| {
        let cells = [GridColumn::Name, GridColumn::Quantity, GridColumn::Price]
            .into_iter()
            .map(|column| {
                let on_cursor = focused && cursor == Some(index) && state.column == column;
                match (&state.editing, on_cursor) {
                    (Some(value), true) => Cell::from(format!("{}|", value))
                        .style(Style::default().fg(Color::Black).bg(Color::Yellow)),
                    (None, true) => Cell::from(cell(row, column).to_string())
                        .style(Style::default().add_modifier(Modifier::UNDERLINED)),
                    _ => Cell::from(cell(row, column).to_string()),
                }
            })
            .collect::<Vec<_>>();

        let style = if state.is_selected(index) {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(cells).style(style).height(1)
    });

    let title = format!(
        "Items ({}) | Total: ${:.2}{}",
        state.rows.len(),
        state.total(),
        if focused { " (selected)" } else { "" }
    );
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL).border_style(border_style))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ")
        .widths(&[
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ]);

    frame.render_stateful_widget(table, area, &mut state.table_state);
}
