pub mod date_picker;
pub mod items_grid;
pub mod notice;
