use crate::models::InvoiceItem;

/// One editable row of the item grid, held as raw cell text until Save
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRow {
    pub name: String,
    pub quantity: String,
    pub price: String,
}

impl Default for LineItemRow {
    fn default() -> Self {
        Self {
            name: String::new(),
            quantity: "1".to_string(),
            price: "0.0".to_string(),
        }
    }
}

impl LineItemRow {
    #[cfg(test)]
    pub fn new(name: &str, quantity: &str, price: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: quantity.to_string(),
            price: price.to_string(),
        }
    }

    /// quantity * price when both cells currently parse
    pub fn amount(&self) -> Option<f64> {
        let quantity = self.quantity.trim().parse::<i32>().ok()?;
        let price = self.price.trim().parse::<f64>().ok()?;
        Some(quantity as f64 * price)
    }
}

impl From<&InvoiceItem> for LineItemRow {
    fn from(item: &InvoiceItem) -> Self {
        Self {
            name: item.item_name.clone(),
            quantity: item.quantity.to_string(),
            price: item.price.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_row_matches_new_line_defaults() {
        let row = LineItemRow::default();
        assert_eq!(row.name, "");
        assert_eq!(row.quantity, "1");
        assert_eq!(row.price, "0.0");
    }

    #[test]
    fn stored_item_renders_back_to_cell_text() {
        let item = InvoiceItem {
            id: 7,
            invoice_id: 3,
            item_name: "Chips".to_string(),
            quantity: 2,
            price: 1.5,
        };
        assert_eq!(LineItemRow::from(&item), LineItemRow::new("Chips", "2", "1.5"));
    }

    #[test]
    fn amount_needs_both_cells_to_parse() {
        assert_eq!(LineItemRow::new("Soda", "3", "0.5").amount(), Some(1.5));
        assert_eq!(LineItemRow::new("Soda", "x", "0.5").amount(), None);
    }
}
