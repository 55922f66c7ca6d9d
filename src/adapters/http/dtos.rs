use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::application::invoice::{InvoiceInput, LineItemInput, ListInvoicesCommand};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;

lazy_static! {
  /// Any Unicode punctuation (general category P) except `-` and `_`.
  /// Symbols such as `$`, `+` or `=` are category S and stay allowed.
  static ref FORBIDDEN_SUBJECT_PUNCTUATION: Regex =
    Regex::new(r"[\p{P}--[\-_]]").expect("subject punctuation pattern is valid");
}

fn validate_subject(subject: &str) -> Result<(), ValidationError> {
  if FORBIDDEN_SUBJECT_PUNCTUATION.is_match(subject) {
    return Err(
      ValidationError::new("subject_punctuation")
        .with_message("Subject may not contain punctuation other than '-' and '_'".into()),
    );
  }
  Ok(())
}

/// Customer block of an invoice request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerRequest {
  #[validate(length(
    min = 1,
    max = 255,
    message = "Customer name must be between 1 and 255 characters"
  ))]
  pub customer_name: String,

  #[serde(default)]
  #[validate(length(min = 1, message = "Customer address is required"))]
  pub address: String,
}

/// One line item of an invoice request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ItemRequest {
  /// Present when the item already exists and is being kept
  #[serde(default)]
  pub item_id: Option<Uuid>,

  #[validate(length(min = 1, max = 255, message = "Item name is required"))]
  pub name: String,

  #[serde(rename = "type")]
  #[validate(length(min = 1, max = 64, message = "Item type is required"))]
  pub item_type: String,

  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

/// Body of both `POST /invoice/v1` and `PATCH /invoice/v1/{id}`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InvoiceRequest {
  #[validate(
    length(min = 1, max = 255, message = "Subject must be between 1 and 255 characters"),
    custom(function = "validate_subject")
  )]
  pub subject: String,

  /// DD-MM-YYYY
  #[validate(length(min = 1, message = "Issue date is required"))]
  pub issue_date: String,

  /// DD-MM-YYYY
  #[validate(length(min = 1, message = "Due date is required"))]
  pub due_date: String,

  #[serde(default)]
  pub sub_total: Decimal,
  #[serde(default)]
  pub tax: Decimal,
  #[serde(default)]
  pub grand_total: Decimal,

  #[validate(nested)]
  pub customer_request: CustomerRequest,

  #[serde(default)]
  #[validate(nested)]
  pub item_request: Vec<ItemRequest>,
}

impl From<InvoiceRequest> for InvoiceInput {
  fn from(request: InvoiceRequest) -> Self {
    InvoiceInput {
      subject: request.subject.to_lowercase(),
      issue_date: request.issue_date,
      due_date: request.due_date,
      sub_total: request.sub_total,
      tax: request.tax,
      grand_total: request.grand_total,
      customer_name: request.customer_request.customer_name.to_lowercase(),
      customer_address: request.customer_request.address,
      items: request
        .item_request
        .into_iter()
        .map(|item| LineItemInput {
          item_id: item.item_id,
          name: item.name,
          item_type: item.item_type,
          quantity: item.quantity,
          unit_price: item.unit_price,
          amount: item.amount,
        })
        .collect(),
    }
  }
}

/// Query string of `GET /invoice/v1`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListInvoicesQuery {
  #[validate(range(min = 1, message = "Page must be at least 1"))]
  pub page: Option<u32>,

  #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
  pub limit: Option<u32>,

  pub invoice_id: Option<String>,
  pub issue_date: Option<String>,
  pub subject: Option<String>,
  pub total_item: Option<i32>,
  pub customer: Option<String>,
  pub due_date: Option<String>,
  pub status: Option<String>,
}

impl From<ListInvoicesQuery> for ListInvoicesCommand {
  fn from(query: ListInvoicesQuery) -> Self {
    ListInvoicesCommand {
      page: query.page.unwrap_or(DEFAULT_PAGE),
      limit: query.limit.unwrap_or(DEFAULT_LIMIT),
      invoice_id: query.invoice_id,
      issue_date: query.issue_date,
      subject: query.subject.map(|s| s.to_lowercase()),
      total_items: query.total_item,
      customer_name: query.customer.map(|c| c.to_lowercase()),
      due_date: query.due_date,
      status: query.status,
    }
  }
}

/// Response of create and update
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceIdResponse {
  pub invoice_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
  pub status: String,
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  /// Error type/code
  pub error: String,

  /// Human-readable error message
  pub message: String,

  /// Optional detailed error information
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}
