use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{Customer, Invoice, InvoiceSummary, LineItem};
use super::errors::RepositoryError;
use super::listing::{InvoiceFilter, InvoiceListQuery};
use super::value_objects::InvoiceNumber;

/// Begins, commits and rolls back units of work.
///
/// A `Session` is the explicit handle every write in the unit of work is
/// executed through. Work done through a session becomes visible only when the
/// session is committed; a rolled-back session leaves no trace in the store.
#[async_trait]
pub trait AtomicSessionProvider: Send + Sync {
  type Session: Send;

  async fn begin(&self) -> Result<Self::Session, RepositoryError>;
  async fn commit(&self, session: Self::Session) -> Result<(), RepositoryError>;
  async fn rollback(&self, session: Self::Session) -> Result<(), RepositoryError>;
}

/// Customer rows. Writes invalidate the cached customer reads once the session commits.
#[async_trait]
pub trait CustomerRepository<S: Send>: Send + Sync {
  async fn create(&self, session: &mut S, customer: &Customer) -> Result<(), RepositoryError>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError>;
  /// Fails with `RepositoryError::NotFound` when no row was updated.
  async fn update(&self, session: &mut S, customer: &Customer) -> Result<(), RepositoryError>;
}

/// Invoice rows. Writes invalidate the cached invoice reads once the session commits.
#[async_trait]
pub trait InvoiceRepository<S: Send>: Send + Sync {
  /// Inserts the invoice and returns it as stored.
  async fn create(&self, session: &mut S, invoice: &Invoice) -> Result<Invoice, RepositoryError>;
  async fn find_page(
    &self,
    query: &InvoiceListQuery,
  ) -> Result<Vec<InvoiceSummary>, RepositoryError>;
  async fn count(&self, filter: &InvoiceFilter) -> Result<i64, RepositoryError>;
  async fn find_by_number(
    &self,
    number: &InvoiceNumber,
  ) -> Result<Option<Invoice>, RepositoryError>;
  /// Highest invoice number in the store, `None` when there is none.
  async fn latest_number(&self) -> Result<Option<String>, RepositoryError>;
  /// Fails with `RepositoryError::NotFound` when no row was updated.
  async fn update(&self, session: &mut S, invoice: &Invoice) -> Result<(), RepositoryError>;
}

/// Line item rows. Writes invalidate the cached item reads once the session commits.
#[async_trait]
pub trait LineItemRepository<S: Send>: Send + Sync {
  async fn create_many(&self, session: &mut S, items: &[LineItem]) -> Result<(), RepositoryError>;
  async fn find_by_invoice_number(
    &self,
    number: &InvoiceNumber,
  ) -> Result<Vec<LineItem>, RepositoryError>;
  async fn update_many(&self, session: &mut S, items: &[LineItem]) -> Result<(), RepositoryError>;
  async fn delete_many(&self, session: &mut S, ids: &[Uuid]) -> Result<(), RepositoryError>;
}

/// Source of fresh customer and line item ids
pub trait IdGenerator: Send + Sync {
  fn new_id(&self) -> Uuid;
}

/// Random (v4) ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
  fn new_id(&self) -> Uuid {
    Uuid::new_v4()
  }
}
