use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::models::LineItemRow;

/// An invoice that passed validation and is ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub customer_name: String,
    pub date: NaiveDate,
    pub items: Vec<NewInvoiceItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
    pub item_name: String,
    pub quantity: i64,
    pub price: f64,
}

/// Check the form contents and build a `NewInvoice` from them.
///
/// Stops at the first violation; row numbers in errors are 1-based.
pub fn validate_invoice(
    customer_name: &str,
    date: NaiveDate,
    rows: &[LineItemRow],
) -> Result<NewInvoice, ValidationError> {
    let customer_name = customer_name.trim();
    if customer_name.is_empty() {
        return Err(ValidationError::EmptyCustomerName);
    }

    if rows.is_empty() {
        return Err(ValidationError::NoItems);
    }

    let items = rows
        .iter()
        .enumerate()
        .map(|(index, row)| validate_row(index + 1, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewInvoice {
        customer_name: customer_name.to_string(),
        date,
        items,
    })
}

fn validate_row(row_number: usize, row: &LineItemRow) -> Result<NewInvoiceItem, ValidationError> {
    let item_name = row.name.trim();
    if item_name.is_empty() {
        return Err(ValidationError::EmptyItemName { row: row_number });
    }

    // Quantities are 32-bit; anything wider is rejected rather than stored
    let quantity = match row.quantity.trim().parse::<i32>() {
        Ok(quantity) if quantity > 0 => i64::from(quantity),
        _ => return Err(ValidationError::InvalidQuantity { row: row_number }),
    };

    // NaN and infinities parse as f64 but are not prices
    let price = match row.price.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        _ => return Err(ValidationError::InvalidPrice { row: row_number }),
    };

    Ok(NewInvoiceItem {
        item_name: item_name.to_string(),
        quantity,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn row(name: &str, quantity: &str, price: &str) -> LineItemRow {
        LineItemRow::new(name, quantity, price)
    }

    #[test]
    fn trims_and_types_a_valid_form() {
        let invoice = validate_invoice(
            "  Alice ",
            date(),
            &[row(" Chips ", " 2", "1.50 "), row("Soda", "1", "0")],
        )
        .unwrap();

        assert_eq!(invoice.customer_name, "Alice");
        assert_eq!(invoice.date, date());
        assert_eq!(
            invoice.items,
            vec![
                NewInvoiceItem { item_name: "Chips".to_string(), quantity: 2, price: 1.5 },
                NewInvoiceItem { item_name: "Soda".to_string(), quantity: 1, price: 0.0 },
            ]
        );
    }

    #[test]
    fn blank_customer_is_rejected_first() {
        let err = validate_invoice("   ", date(), &[]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyCustomerName);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err = validate_invoice("Alice", date(), &[]).unwrap_err();
        assert_eq!(err, ValidationError::NoItems);
        assert_eq!(err.to_string(), "Add at least one item to the invoice.");
    }

    #[test]
    fn reports_the_first_failing_row() {
        let rows = [row("Chips", "1", "1"), row("  ", "1", "1"), row("", "0", "-1")];
        let err = validate_invoice("Alice", date(), &rows).unwrap_err();
        assert_eq!(err, ValidationError::EmptyItemName { row: 2 });
        assert_eq!(err.to_string(), "Item name in row 2 is empty.");
    }

    #[test]
    fn rejects_bad_quantities() {
        for quantity in ["0", "-3", "abc", "1.5", "", "3000000000"] {
            let err = validate_invoice("Alice", date(), &[row("Chips", quantity, "1")]).unwrap_err();
            assert_eq!(err, ValidationError::InvalidQuantity { row: 1 }, "quantity {quantity:?}");
        }
    }

    #[test]
    fn accepts_the_largest_32_bit_quantity() {
        let invoice = validate_invoice("Alice", date(), &[row("Chips", "2147483647", "1")]).unwrap();
        assert_eq!(invoice.items[0].quantity, 2_147_483_647);
    }

    #[test]
    fn rejects_bad_prices() {
        for price in ["-1", "xyz", "NaN", "inf", ""] {
            let err = validate_invoice("Alice", date(), &[row("Chips", "1", price)]).unwrap_err();
            assert_eq!(err, ValidationError::InvalidPrice { row: 1 }, "price {price:?}");
        }
    }

    #[test]
    fn name_is_checked_before_quantity_and_price() {
        let err = validate_invoice("Alice", date(), &[row("", "abc", "xyz")]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyItemName { row: 1 });

        let err = validate_invoice("Alice", date(), &[row("Chips", "abc", "xyz")]).unwrap_err();
        assert_eq!(err, ValidationError::InvalidQuantity { row: 1 });
    }
}
