use thiserror::Error;

/// The database could not be brought up; the application cannot continue.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to create {table} table: {source}")]
    CreateTable {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// User input that breaks a business rule. Rows are 1-based.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("Customer name cannot be empty.")]
    EmptyCustomerName,
    #[error("Add at least one item to the invoice.")]
    NoItems,
    #[error("Item name in row {row} is empty.")]
    EmptyItemName { row: usize },
    #[error("Quantity in row {row} is invalid.")]
    InvalidQuantity { row: usize },
    #[error("Price in row {row} is invalid.")]
    InvalidPrice { row: usize },
}

/// A write failed inside the save transaction, which has been rolled back.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to start transaction: {0}")]
    Begin(#[source] sqlx::Error),
    #[error("Failed to insert invoice: {0}")]
    InsertInvoice(#[source] sqlx::Error),
    #[error("Failed to insert invoice item: {source}")]
    InsertItem {
        row: usize,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to fetch last invoice: {0}")]
    FetchInvoice(#[source] sqlx::Error),
    #[error("Failed to fetch invoice items: {0}")]
    FetchItems(#[source] sqlx::Error),
}

/// Everything that can stop a save.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
