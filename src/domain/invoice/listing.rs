use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::value_objects::{InvoiceNumber, InvoiceStatus};

/// Optional equality filters for the invoice list. `None` means "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFilter {
  pub invoice_number: Option<InvoiceNumber>,
  pub issue_date: Option<NaiveDate>,
  pub subject: Option<String>,
  pub total_items: Option<i32>,
  pub customer_name: Option<String>,
  pub due_date: Option<NaiveDate>,
  pub status: Option<InvoiceStatus>,
}

/// One page of the filtered invoice list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceListQuery {
  pub filter: InvoiceFilter,
  pub page: u32,
  pub limit: u32,
}

impl InvoiceListQuery {
  pub fn new(filter: InvoiceFilter, page: u32, limit: u32) -> Self {
    Self {
      filter,
      page: page.max(1),
      limit,
    }
  }

  pub fn offset(&self) -> i64 {
    (i64::from(self.page) - 1) * i64::from(self.limit)
  }
}

/// Pagination metadata returned alongside a page of invoices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
  pub current_page: u32,
  pub limit: u32,
  pub total_page: u32,
  pub total_data: i64,
}

impl Pagination {
  pub fn new(page: u32, limit: u32, total_data: i64) -> Self {
    let total_page = if limit == 0 || total_data <= 0 {
      0
    } else {
      let pages = (total_data - 1) / i64::from(limit) + 1;
      u32::try_from(pages).unwrap_or(u32::MAX)
    };

    Self {
      current_page: page,
      limit,
      total_page,
      total_data,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_total_pages() {
    assert_eq!(Pagination::new(1, 10, 10).total_page, 1);
    assert_eq!(Pagination::new(1, 10, 11).total_page, 2);
    assert_eq!(Pagination::new(1, 10, 0).total_page, 0);
    assert_eq!(Pagination::new(3, 5, 25).total_page, 5);
  }

  #[test]
  fn test_total_pages_saturate() {
    assert_eq!(Pagination::new(1, 1, i64::MAX).total_page, u32::MAX);
    assert_eq!(Pagination::new(1, 1, i64::from(u32::MAX)).total_page, u32::MAX);
    assert_eq!(
      Pagination::new(1, 2, i64::from(u32::MAX) + 1).total_page,
      1 << 31
    );
  }

  #[test]
  fn test_zero_limit_does_not_divide() {
    let pagination = Pagination::new(1, 0, 42);
    assert_eq!(pagination.total_page, 0);
    assert_eq!(pagination.total_data, 42);
  }

  #[test]
  fn test_offset() {
    assert_eq!(
      InvoiceListQuery::new(InvoiceFilter::default(), 1, 10).offset(),
      0
    );
    assert_eq!(
      InvoiceListQuery::new(InvoiceFilter::default(), 3, 10).offset(),
      20
    );
    // page 0 is clamped to the first page
    assert_eq!(
      InvoiceListQuery::new(InvoiceFilter::default(), 0, 10).offset(),
      0
    );
  }
}
