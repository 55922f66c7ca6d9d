use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{CustomerName, InvoiceNumber, InvoiceStatus};

// Customer - created once per invoice, never shared between invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub id: Uuid,
  pub name: CustomerName,
  pub address: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Customer {
  pub fn new(id: Uuid, name: CustomerName, address: String) -> Self {
    let now = Utc::now();
    Self {
      id,
      name,
      address,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn update(&mut self, name: CustomerName, address: String) {
    self.name = name;
    self.address = address;
    self.updated_at = Utc::now();
  }
}

/// Header fields supplied by the caller on both create and update
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceHeader {
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub subject: String,
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub grand_total: Decimal,
}

// Invoice - header row, keyed by its human-facing number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub number: InvoiceNumber,
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub subject: String,
  pub total_items: i32,
  pub customer_id: Uuid,
  pub status: InvoiceStatus,
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub grand_total: Decimal,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Invoice {
  pub fn new(
    number: InvoiceNumber,
    customer_id: Uuid,
    header: InvoiceHeader,
    total_items: usize,
  ) -> Self {
    let now = Utc::now();
    Self {
      number,
      issue_date: header.issue_date,
      due_date: header.due_date,
      subject: header.subject,
      total_items: item_count(total_items),
      customer_id,
      status: InvoiceStatus::Unpaid,
      subtotal: header.subtotal,
      tax: header.tax,
      grand_total: header.grand_total,
      created_at: now,
      updated_at: now,
    }
  }

  /// Applies an update request. Number, customer reference and status are kept.
  pub fn revise(&mut self, header: InvoiceHeader, total_items: usize) {
    self.issue_date = header.issue_date;
    self.due_date = header.due_date;
    self.subject = header.subject;
    self.total_items = item_count(total_items);
    self.subtotal = header.subtotal;
    self.tax = header.tax;
    self.grand_total = header.grand_total;
    self.updated_at = Utc::now();
  }
}

fn item_count(len: usize) -> i32 {
  i32::try_from(len).unwrap_or(i32::MAX)
}

/// Invoice row as listed, joined with its customer's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
  pub invoice: Invoice,
  pub customer_name: String,
}

/// Line item as requested by a caller. `id` is only present on update for
/// items the caller intends to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemData {
  pub id: Option<Uuid>,
  pub name: String,
  pub item_type: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

// Line Item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub id: Uuid,
  pub invoice_number: InvoiceNumber,
  pub name: String,
  pub item_type: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

impl LineItem {
  pub fn new(id: Uuid, invoice_number: InvoiceNumber, data: LineItemData) -> Self {
    Self {
      id,
      invoice_number,
      name: data.name,
      item_type: data.item_type,
      quantity: data.quantity,
      unit_price: data.unit_price,
      amount: data.amount,
    }
  }
}
