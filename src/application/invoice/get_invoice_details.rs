use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{
  AtomicSessionProvider, InvoiceError, InvoiceNumber, InvoiceService, format_date,
};

#[derive(Debug, Deserialize)]
pub struct GetInvoiceDetailsCommand {
  pub invoice_id: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerDetailsDto {
  pub id: Uuid,
  pub name: String,
  pub address: String,
}

#[derive(Debug, Serialize)]
pub struct LineItemDto {
  pub item_id: Uuid,
  pub name: String,
  #[serde(rename = "type")]
  pub item_type: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailsResponse {
  pub invoice_id: String,
  pub issue_date: String,
  pub due_date: String,
  pub subject: String,
  pub status: String,
  pub total_items: i32,
  pub sub_total: Decimal,
  pub tax: Decimal,
  pub grand_total: Decimal,
  pub customer: CustomerDetailsDto,
  pub items: Vec<LineItemDto>,
}

pub struct GetInvoiceDetailsUseCase<P: AtomicSessionProvider> {
  invoice_service: Arc<InvoiceService<P>>,
}

impl<P: AtomicSessionProvider> GetInvoiceDetailsUseCase<P> {
  pub fn new(invoice_service: Arc<InvoiceService<P>>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: GetInvoiceDetailsCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    let number = InvoiceNumber::new(command.invoice_id)?;

    let (invoice, customer, line_items) = self
      .invoice_service
      .get_invoice_with_details(&number)
      .await?;

    let items = line_items
      .into_iter()
      .map(|item| LineItemDto {
        item_id: item.id,
        name: item.name,
        item_type: item.item_type,
        quantity: item.quantity,
        unit_price: item.unit_price,
        amount: item.amount,
      })
      .collect();

    Ok(InvoiceDetailsResponse {
      invoice_id: invoice.number.into_inner(),
      issue_date: format_date(invoice.issue_date),
      due_date: format_date(invoice.due_date),
      subject: invoice.subject,
      status: invoice.status.as_str().to_string(),
      total_items: invoice.total_items,
      sub_total: invoice.subtotal,
      tax: invoice.tax,
      grand_total: invoice.grand_total,
      customer: CustomerDetailsDto {
        id: customer.id,
        name: customer.name.into_inner(),
        address: customer.address,
      },
      items,
    })
  }
}
