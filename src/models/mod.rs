mod invoice;
mod invoice_item;
mod line_item_row;
mod new_invoice;

pub use invoice::Invoice;
pub use invoice_item::InvoiceItem;
pub use line_item_row::LineItemRow;
pub use new_invoice::{NewInvoice, NewInvoiceItem, validate_invoice};
