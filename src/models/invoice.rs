use chrono::NaiveDate;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: i64,
    pub customer_name: String,
    pub date: NaiveDate,
}
