#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub price: f64,
}
