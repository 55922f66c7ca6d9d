use super::value_objects::ValueObjectError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum InvoiceError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Invalid line items: {0}")]
  InvalidLineItems(String),

  #[error("Invoice not found: {0}")]
  InvoiceNotFound(String),

  #[error("Customer not found: {0}")]
  CustomerNotFound(Uuid),

  #[error("Repository error: {0}")]
  Repository(#[from] RepositoryError),

  #[error("Transaction failed: {0}")]
  Transaction(String),
}

/// Failures reported by the persistence collaborators
#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("Record not found")]
  NotFound,

  #[error("Duplicate key violation: {0}")]
  DuplicateKey(String),

  #[error("Corrupt record: {0}")]
  CorruptRecord(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

impl InvoiceError {
  /// True for the two domain not-found conditions exposed to callers.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      InvoiceError::InvoiceNotFound(_) | InvoiceError::CustomerNotFound(_)
    )
  }
}

impl From<ValueObjectError> for RepositoryError {
  fn from(e: ValueObjectError) -> Self {
    RepositoryError::CorruptRecord(e.to_string())
  }
}
