pub mod customer_repository;
pub mod invoice_repository;
pub mod line_item_repository;
pub mod session_provider;

pub use customer_repository::PostgresCustomerRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use line_item_repository::PostgresLineItemRepository;
pub use session_provider::{PgSession, PostgresSessionProvider};

use crate::domain::invoice::errors::RepositoryError;

/// Maps an insert failure, turning unique violations into `DuplicateKey`.
pub(crate) fn map_write_error(e: sqlx::Error, entity: &str) -> RepositoryError {
  if let sqlx::Error::Database(db_err) = &e {
    // PostgreSQL unique violation code
    if db_err.code().as_deref() == Some("23505") {
      let detail = db_err
        .constraint()
        .map(|c| format!("{} violates {}", entity, c))
        .unwrap_or_else(|| format!("{} already exists", entity));
      return RepositoryError::DuplicateKey(detail);
    }
  }
  RepositoryError::Database(e)
}
