use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{PersistenceError, ReadError, StartupError};
use crate::models::{Invoice, InvoiceItem, NewInvoice};

const CREATE_INVOICES: &str = r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name TEXT NOT NULL,
        date TEXT NOT NULL
    )
"#;

const CREATE_INVOICE_ITEMS: &str = r#"
    CREATE TABLE IF NOT EXISTS invoice_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_id INTEGER NOT NULL,
        item_name TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        price REAL NOT NULL,
        FOREIGN KEY (invoice_id) REFERENCES invoices(id) ON DELETE CASCADE
    )
"#;

/// Handle to the local invoice database.
///
/// Backed by a single-connection pool: the form is the only user and every
/// statement runs on the event loop, one at a time.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file at `path` and make sure both tables exist
    pub async fn open(path: &str) -> Result<Self, StartupError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| StartupError::Open {
                path: path.to_string(),
                source,
            })?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!("database {} ready", path);
        Ok(db)
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), StartupError> {
        for (table, ddl) in [("invoices", CREATE_INVOICES), ("invoice_items", CREATE_INVOICE_ITEMS)] {
            sqlx::query(ddl)
                .execute(self.get_pool())
                .await
                .map_err(|source| StartupError::CreateTable { table, source })?;
        }

        Ok(())
    }

    /// Write the invoice header and all of its items in one transaction.
    ///
    /// Returns the generated invoice id. On any failure the transaction is
    /// rolled back and nothing of the invoice remains.
    pub async fn save_invoice(&self, invoice: &NewInvoice) -> Result<i64, PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(PersistenceError::Begin)?;

        let invoice_id = match sqlx::query("INSERT INTO invoices (customer_name, date) VALUES (?, ?)")
            .bind(invoice.customer_name.as_str())
            .bind(invoice.date.format("%Y-%m-%d").to_string())
            .execute(&mut *tx)
            .await
        {
            Ok(result) => result.last_insert_rowid(),
            Err(source) => {
                rollback(tx).await;
                return Err(PersistenceError::InsertInvoice(source));
            }
        };

        for (index, item) in invoice.items.iter().enumerate() {
            let inserted = sqlx::query(
                "INSERT INTO invoice_items (invoice_id, item_name, quantity, price) VALUES (?, ?, ?, ?)",
            )
            .bind(invoice_id)
            .bind(item.item_name.as_str())
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await;

            if let Err(source) = inserted {
                rollback(tx).await;
                return Err(PersistenceError::InsertItem { row: index + 1, source });
            }
        }

        // A failed commit leaves the guard open; dropping it rolls back.
        tx.commit().await.map_err(PersistenceError::Commit)?;

        info!("saved invoice {} with {} items", invoice_id, invoice.items.len());
        Ok(invoice_id)
    }

    /// The invoice with the highest id, if any exist
    pub async fn latest_invoice(&self) -> Result<Option<Invoice>, ReadError> {
        sqlx::query_as::<_, Invoice>(
            "SELECT id, customer_name, date FROM invoices ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(self.get_pool())
        .await
        .map_err(ReadError::FetchInvoice)
    }

    pub async fn items_for_invoice(&self, invoice_id: i64) -> Result<Vec<InvoiceItem>, ReadError> {
        sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, item_name, quantity, price
            FROM invoice_items
            WHERE invoice_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(self.get_pool())
        .await
        .map_err(ReadError::FetchItems)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub async fn row_counts(&self) -> (i64, i64) {
        let invoices = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
            .fetch_one(self.get_pool())
            .await
            .unwrap();
        let items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoice_items")
            .fetch_one(self.get_pool())
            .await
            .unwrap();
        (invoices, items)
    }
}

async fn rollback(tx: Transaction<'_, Sqlite>) {
    match tx.rollback().await {
        Ok(()) => warn!("save rolled back"),
        Err(err) => warn!("rollback failed: {}", err),
    }
}

/// Open the database named by the configuration
pub async fn init(config: &Config) -> Result<Database, StartupError> {
    Database::open(config.database_path()).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::NewInvoiceItem;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    pub(crate) async fn open_temp(dir: &TempDir) -> Database {
        let path = dir.path().join("snackshop.db");
        Database::open(path.to_str().unwrap()).await.unwrap()
    }

    /// Make every insert of an item with this name fail
    pub(crate) async fn poison_item_name(db: &Database, name: &str) {
        let trigger = format!(
            "CREATE TRIGGER poison_item BEFORE INSERT ON invoice_items \
             WHEN NEW.item_name = '{name}' BEGIN SELECT RAISE(ABORT, 'poisoned item'); END"
        );
        sqlx::query(&trigger).execute(db.get_pool()).await.unwrap();
    }

    fn item(name: &str, quantity: i64, price: f64) -> NewInvoiceItem {
        NewInvoiceItem {
            item_name: name.to_string(),
            quantity,
            price,
        }
    }

    fn invoice(customer: &str, items: Vec<NewInvoiceItem>) -> NewInvoice {
        NewInvoice {
            customer_name: customer.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            items,
        }
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let db = open_temp(&dir).await;
        db.save_invoice(&invoice("Alice", vec![item("Chips", 1, 1.0)]))
            .await
            .unwrap();
        db.close().await;

        let reopened = open_temp(&dir).await;
        assert_eq!(reopened.row_counts().await, (1, 1));
    }

    #[tokio::test]
    async fn open_fails_when_directory_is_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("snackshop.db");

        let err = Database::open(path.to_str().unwrap()).await.err().unwrap();
        assert!(matches!(err, StartupError::Open { .. }));
    }

    #[tokio::test]
    async fn save_writes_header_and_every_item() {
        let dir = TempDir::new().unwrap();
        let db = open_temp(&dir).await;

        let id = db
            .save_invoice(&invoice(
                "Alice",
                vec![item("Chips", 2, 1.5), item("Soda", 1, 0.99), item("Gum", 5, 0.25)],
            ))
            .await
            .unwrap();

        assert_eq!(db.row_counts().await, (1, 3));

        let stored_date: String = sqlx::query_scalar("SELECT date FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_one(db.get_pool())
            .await
            .unwrap();
        assert_eq!(stored_date, "2024-05-17");

        let items = db.items_for_invoice(id).await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, ["Chips", "Soda", "Gum"]);
        assert!(items.iter().all(|i| i.invoice_id == id));
    }

    #[tokio::test]
    async fn failing_item_insert_leaves_no_partial_invoice() {
        let dir = TempDir::new().unwrap();
        let db = open_temp(&dir).await;
        db.save_invoice(&invoice("Before", vec![item("Chips", 1, 1.0)]))
            .await
            .unwrap();
        poison_item_name(&db, "Boom").await;

        for k in 1..=3 {
            let mut items = vec![item("Chips", 1, 1.0), item("Soda", 1, 1.0), item("Gum", 1, 1.0)];
            items[k - 1].item_name = "Boom".to_string();

            let err = db.save_invoice(&invoice("Alice", items)).await.unwrap_err();
            assert!(matches!(err, PersistenceError::InsertItem { row, .. } if row == k));
            assert_eq!(db.row_counts().await, (1, 1));
        }
    }

    #[tokio::test]
    async fn latest_invoice_is_the_highest_id() {
        let dir = TempDir::new().unwrap();
        let db = open_temp(&dir).await;
        assert_eq!(db.latest_invoice().await.unwrap(), None);

        db.save_invoice(&invoice("Alice", vec![item("Chips", 1, 1.0)]))
            .await
            .unwrap();
        let second = db
            .save_invoice(&invoice("Bob", vec![item("Soda", 1, 1.0)]))
            .await
            .unwrap();

        let latest = db.latest_invoice().await.unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.customer_name, "Bob");
        assert_eq!(latest.date, NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
    }

    #[tokio::test]
    async fn deleting_an_invoice_cascades_to_its_items() {
        let dir = TempDir::new().unwrap();
        let db = open_temp(&dir).await;
        let id = db
            .save_invoice(&invoice("Alice", vec![item("Chips", 1, 1.0), item("Soda", 1, 1.0)]))
            .await
            .unwrap();

        sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(db.get_pool())
            .await
            .unwrap();

        assert_eq!(db.row_counts().await, (0, 0));
    }

    #[tokio::test]
    async fn item_query_failure_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let db = open_temp(&dir).await;
        sqlx::query("DROP TABLE invoice_items")
            .execute(db.get_pool())
            .await
            .unwrap();

        let err = db.items_for_invoice(1).await.unwrap_err();
        assert!(matches!(err, ReadError::FetchItems(_)));
    }
}
