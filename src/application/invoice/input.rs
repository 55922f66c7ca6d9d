use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::invoice::{
  CustomerName, InvoiceData, InvoiceError, InvoiceHeader, LineItemData, parse_date,
};

/// Line item as sent by a caller. `item_id` is set for stored items being kept.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
  pub item_id: Option<Uuid>,
  pub name: String,
  pub item_type: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

/// Invoice body shared by create and update. Dates are `DD-MM-YYYY`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceInput {
  pub subject: String,
  pub issue_date: String,
  pub due_date: String,
  pub sub_total: Decimal,
  pub tax: Decimal,
  pub grand_total: Decimal,
  pub customer_name: String,
  pub customer_address: String,
  pub items: Vec<LineItemInput>,
}

impl TryFrom<InvoiceInput> for InvoiceData {
  type Error = InvoiceError;

  fn try_from(input: InvoiceInput) -> Result<Self, Self::Error> {
    let header = InvoiceHeader {
      issue_date: parse_date(&input.issue_date)?,
      due_date: parse_date(&input.due_date)?,
      subject: input.subject,
      subtotal: input.sub_total,
      tax: input.tax,
      grand_total: input.grand_total,
    };

    let line_items = input
      .items
      .into_iter()
      .map(|item| LineItemData {
        id: item.item_id,
        name: item.name,
        item_type: item.item_type,
        quantity: item.quantity,
        unit_price: item.unit_price,
        amount: item.amount,
      })
      .collect();

    Ok(InvoiceData {
      header,
      customer_name: CustomerName::new(input.customer_name)?,
      customer_address: input.customer_address,
      line_items,
    })
  }
}
