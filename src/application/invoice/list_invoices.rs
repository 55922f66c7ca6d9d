use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::invoice::{
  AtomicSessionProvider, InvoiceError, InvoiceFilter, InvoiceListQuery, InvoiceNumber,
  InvoiceService, InvoiceStatus, Pagination, format_date, parse_date,
};

/// Empty strings and a zero item count mean "not filtered".
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesCommand {
  pub page: u32,
  pub limit: u32,
  pub invoice_id: Option<String>,
  pub issue_date: Option<String>,
  pub subject: Option<String>,
  pub total_items: Option<i32>,
  pub customer_name: Option<String>,
  pub due_date: Option<String>,
  pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListItemDto {
  pub invoice_id: String,
  pub issue_date: String,
  pub subject: String,
  pub total_items: i32,
  pub customer_name: String,
  pub due_date: String,
  pub status: String,
  pub grand_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PaginationDto {
  pub current_page: u32,
  pub limit: u32,
  pub total_page: u32,
  pub total_data: i64,
}

impl From<Pagination> for PaginationDto {
  fn from(p: Pagination) -> Self {
    Self {
      current_page: p.current_page,
      limit: p.limit,
      total_page: p.total_page,
      total_data: p.total_data,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ListInvoicesResponse {
  pub data: Vec<InvoiceListItemDto>,
  pub pagination: PaginationDto,
}

fn non_empty(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

impl TryFrom<ListInvoicesCommand> for InvoiceListQuery {
  type Error = InvoiceError;

  fn try_from(command: ListInvoicesCommand) -> Result<Self, Self::Error> {
    let filter = InvoiceFilter {
      invoice_number: non_empty(command.invoice_id)
        .map(InvoiceNumber::new)
        .transpose()?,
      issue_date: non_empty(command.issue_date)
        .map(|d| parse_date(&d))
        .transpose()?,
      subject: non_empty(command.subject),
      total_items: command.total_items.filter(|t| *t != 0),
      customer_name: non_empty(command.customer_name),
      due_date: non_empty(command.due_date)
        .map(|d| parse_date(&d))
        .transpose()?,
      status: non_empty(command.status)
        .map(|s| InvoiceStatus::from_str(&s))
        .transpose()?,
    };

    Ok(InvoiceListQuery::new(filter, command.page, command.limit))
  }
}

pub struct ListInvoicesUseCase<P: AtomicSessionProvider> {
  invoice_service: Arc<InvoiceService<P>>,
}

impl<P: AtomicSessionProvider> ListInvoicesUseCase<P> {
  pub fn new(invoice_service: Arc<InvoiceService<P>>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: ListInvoicesCommand,
  ) -> Result<ListInvoicesResponse, InvoiceError> {
    let query = InvoiceListQuery::try_from(command)?;

    let (invoices, pagination) = self.invoice_service.list_invoices(&query).await?;

    let data = invoices
      .into_iter()
      .map(|row| InvoiceListItemDto {
        invoice_id: row.invoice.number.into_inner(),
        issue_date: format_date(row.invoice.issue_date),
        subject: row.invoice.subject,
        total_items: row.invoice.total_items,
        customer_name: row.customer_name,
        due_date: format_date(row.invoice.due_date),
        status: row.invoice.status.as_str().to_string(),
        grand_total: row.invoice.grand_total,
      })
      .collect();

    Ok(ListInvoicesResponse {
      data,
      pagination: pagination.into(),
    })
  }
}
