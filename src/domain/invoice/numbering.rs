//! Sequential invoice numbers.
//!
//! Numbers are decimal integers rendered zero-padded to at least four digits.
//! The store is the only source of the current maximum; this module just
//! derives the successor.

use super::value_objects::{InvoiceNumber, ValueObjectError};

const WIDTH: usize = 4;

/// Returns the number that follows `latest`.
///
/// An empty `latest` means no invoice exists yet and yields `"0001"`. Anything
/// that is not a non-negative decimal integer is rejected rather than guessed
/// at, as is a value whose successor does not fit in a `u64`.
pub fn next_invoice_number(latest: &str) -> Result<InvoiceNumber, ValueObjectError> {
  let latest = latest.trim();
  let latest = if latest.is_empty() { "0000" } else { latest };

  if !latest.bytes().all(|b| b.is_ascii_digit()) {
    return Err(ValueObjectError::InvalidInvoiceNumber(format!(
      "'{}' is not a decimal invoice number",
      latest
    )));
  }

  let current: u64 = latest.parse().map_err(|e| {
    ValueObjectError::InvalidInvoiceNumber(format!("'{}' cannot be parsed: {}", latest, e))
  })?;

  let next = current.checked_add(1).ok_or_else(|| {
    ValueObjectError::InvalidInvoiceNumber(format!("'{}' has no successor", latest))
  })?;

  InvoiceNumber::new(format!("{:0width$}", next, width = WIDTH))
}
