//! In-process store with the same unit-of-work semantics as the Postgres
//! adapter: writes land in a private copy of the state that replaces the
//! committed state only on commit.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::invoice::{
  Customer, Invoice, InvoiceFilter, InvoiceListQuery, InvoiceNumber, InvoiceSummary, LineItem,
  errors::RepositoryError,
  ports::{
    AtomicSessionProvider, CustomerRepository, IdGenerator, InvoiceRepository, LineItemRepository,
  },
};
use crate::infrastructure::cache::keys;

/// Operations that can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
  CreateCustomer,
  CreateInvoice,
  CreateLineItems,
  UpdateInvoice,
  FindCustomer,
  FindLineItemsNotFound,
  Count,
  Commit,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
  customers: Vec<Customer>,
  invoices: Vec<Invoice>,
  line_items: Vec<LineItem>,
}

#[derive(Default)]
struct Inner {
  committed: MemoryState,
  failures: HashSet<FailPoint>,
  latest_number_override: Option<String>,
  invalidated: Vec<&'static str>,
}

pub struct MemorySession {
  state: MemoryState,
  invalidations: Vec<&'static str>,
}

impl MemorySession {
  fn invalidate_after_commit(&mut self, family: &'static str) {
    if !self.invalidations.contains(&family) {
      self.invalidations.push(family);
    }
  }
}

/// Shared handle; every repository created from it sees the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap()
  }

  fn check(&self, point: FailPoint) -> Result<(), RepositoryError> {
    if self.lock().failures.contains(&point) {
      return Err(RepositoryError::CorruptRecord(format!("injected failure at {:?}", point)));
    }
    Ok(())
  }

  pub fn invoices(&self) -> MemoryInvoiceRepository {
    MemoryInvoiceRepository { store: self.clone() }
  }

  pub fn customers(&self) -> MemoryCustomerRepository {
    MemoryCustomerRepository { store: self.clone() }
  }

  pub fn line_items(&self) -> MemoryLineItemRepository {
    MemoryLineItemRepository { store: self.clone() }
  }

  pub fn session_provider(&self) -> MemorySessionProvider {
    MemorySessionProvider { store: self.clone() }
  }

  pub fn fail_at(&self, point: FailPoint) {
    self.lock().failures.insert(point);
  }

  pub fn set_latest_number_override(&self, latest: Option<String>) {
    self.lock().latest_number_override = latest;
  }

  pub fn remove_customer(&self, id: Uuid) {
    self.lock().committed.customers.retain(|c| c.id != id);
  }

  pub fn customer_rows(&self) -> Vec<Customer> {
    self.lock().committed.customers.clone()
  }

  pub fn invoice_rows(&self) -> Vec<Invoice> {
    self.lock().committed.invoices.clone()
  }

  pub fn line_item_rows(&self) -> Vec<LineItem> {
    self.lock().committed.line_items.clone()
  }

  pub fn invalidated_families(&self) -> Vec<&'static str> {
    self.lock().invalidated.clone()
  }
}

pub struct MemorySessionProvider {
  store: MemoryStore,
}

#[async_trait]
impl AtomicSessionProvider for MemorySessionProvider {
  type Session = MemorySession;

  async fn begin(&self) -> Result<MemorySession, RepositoryError> {
    Ok(MemorySession {
      state: self.store.lock().committed.clone(),
      invalidations: Vec::new(),
    })
  }

  async fn commit(&self, session: MemorySession) -> Result<(), RepositoryError> {
    self.store.check(FailPoint::Commit)?;
    let mut inner = self.store.lock();
    inner.committed = session.state;
    inner.invalidated.extend(session.invalidations);
    Ok(())
  }

  async fn rollback(&self, _session: MemorySession) -> Result<(), RepositoryError> {
    Ok(())
  }
}

pub struct MemoryCustomerRepository {
  store: MemoryStore,
}

#[async_trait]
impl CustomerRepository<MemorySession> for MemoryCustomerRepository {
  async fn create(
    &self,
    session: &mut MemorySession,
    customer: &Customer,
  ) -> Result<(), RepositoryError> {
    self.store.check(FailPoint::CreateCustomer)?;
    if session.state.customers.iter().any(|c| c.id == customer.id) {
      return Err(RepositoryError::DuplicateKey(customer.id.to_string()));
    }
    session.state.customers.push(customer.clone());
    session.invalidate_after_commit(keys::CUSTOMER_FAMILY);
    Ok(())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError> {
    self.store.check(FailPoint::FindCustomer)?;
    Ok(
      self
        .store
        .lock()
        .committed
        .customers
        .iter()
        .find(|c| c.id == id)
        .cloned(),
    )
  }

  async fn update(
    &self,
    session: &mut MemorySession,
    customer: &Customer,
  ) -> Result<(), RepositoryError> {
    let stored = session
      .state
      .customers
      .iter_mut()
      .find(|c| c.id == customer.id)
      .ok_or(RepositoryError::NotFound)?;
    *stored = customer.clone();
    session.invalidate_after_commit(keys::CUSTOMER_FAMILY);
    Ok(())
  }
}

pub struct MemoryInvoiceRepository {
  store: MemoryStore,
}

impl MemoryInvoiceRepository {
  fn matching(state: &MemoryState, filter: &InvoiceFilter) -> Vec<InvoiceSummary> {
    let mut rows: Vec<InvoiceSummary> = state
      .invoices
      .iter()
      .filter_map(|invoice| {
        let customer = state.customers.iter().find(|c| c.id == invoice.customer_id)?;
        let keep = filter.invoice_number.as_ref().is_none_or(|n| *n == invoice.number)
          && filter.issue_date.is_none_or(|d| d == invoice.issue_date)
          && filter.subject.as_ref().is_none_or(|s| *s == invoice.subject)
          && filter.total_items.is_none_or(|t| t == invoice.total_items)
          && filter
            .customer_name
            .as_ref()
            .is_none_or(|n| n == customer.name.value())
          && filter.due_date.is_none_or(|d| d == invoice.due_date)
          && filter.status.is_none_or(|s| s == invoice.status);
        keep.then(|| InvoiceSummary {
          invoice: invoice.clone(),
          customer_name: customer.name.value().to_string(),
        })
      })
      .collect();

    rows.sort_by(|a, b| {
      let (a, b) = (a.invoice.number.value(), b.invoice.number.value());
      b.len().cmp(&a.len()).then_with(|| b.cmp(a))
    });
    rows
  }
}

#[async_trait]
impl InvoiceRepository<MemorySession> for MemoryInvoiceRepository {
  async fn create(
    &self,
    session: &mut MemorySession,
    invoice: &Invoice,
  ) -> Result<Invoice, RepositoryError> {
    self.store.check(FailPoint::CreateInvoice)?;
    if session.state.invoices.iter().any(|i| i.number == invoice.number) {
      return Err(RepositoryError::DuplicateKey(invoice.number.to_string()));
    }
    session.state.invoices.push(invoice.clone());
    session.invalidate_after_commit(keys::INVOICE_FAMILY);
    Ok(invoice.clone())
  }

  async fn find_page(
    &self,
    query: &InvoiceListQuery,
  ) -> Result<Vec<InvoiceSummary>, RepositoryError> {
    let inner = self.store.lock();
    Ok(
      Self::matching(&inner.committed, &query.filter)
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.limit as usize)
        .collect(),
    )
  }

  async fn count(&self, filter: &InvoiceFilter) -> Result<i64, RepositoryError> {
    self.store.check(FailPoint::Count)?;
    let inner = self.store.lock();
    Ok(Self::matching(&inner.committed, filter).len() as i64)
  }

  async fn find_by_number(
    &self,
    number: &InvoiceNumber,
  ) -> Result<Option<Invoice>, RepositoryError> {
    Ok(
      self
        .store
        .lock()
        .committed
        .invoices
        .iter()
        .find(|i| i.number == *number)
        .cloned(),
    )
  }

  async fn latest_number(&self) -> Result<Option<String>, RepositoryError> {
    let inner = self.store.lock();
    if let Some(latest) = &inner.latest_number_override {
      return Ok(Some(latest.clone()));
    }
    Ok(
      inner
        .committed
        .invoices
        .iter()
        .map(|i| i.number.value())
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .map(str::to_string),
    )
  }

  async fn update(
    &self,
    session: &mut MemorySession,
    invoice: &Invoice,
  ) -> Result<(), RepositoryError> {
    self.store.check(FailPoint::UpdateInvoice)?;
    let stored = session
      .state
      .invoices
      .iter_mut()
      .find(|i| i.number == invoice.number)
      .ok_or(RepositoryError::NotFound)?;
    *stored = invoice.clone();
    session.invalidate_after_commit(keys::INVOICE_FAMILY);
    Ok(())
  }
}

pub struct MemoryLineItemRepository {
  store: MemoryStore,
}

#[async_trait]
impl LineItemRepository<MemorySession> for MemoryLineItemRepository {
  async fn create_many(
    &self,
    session: &mut MemorySession,
    items: &[LineItem],
  ) -> Result<(), RepositoryError> {
    self.store.check(FailPoint::CreateLineItems)?;
    session.state.line_items.extend_from_slice(items);
    session.invalidate_after_commit(keys::LINE_ITEM_FAMILY);
    Ok(())
  }

  async fn find_by_invoice_number(
    &self,
    number: &InvoiceNumber,
  ) -> Result<Vec<LineItem>, RepositoryError> {
    if self.store.lock().failures.contains(&FailPoint::FindLineItemsNotFound) {
      return Err(RepositoryError::NotFound);
    }
    Ok(
      self
        .store
        .lock()
        .committed
        .line_items
        .iter()
        .filter(|i| i.invoice_number == *number)
        .cloned()
        .collect(),
    )
  }

  async fn update_many(
    &self,
    session: &mut MemorySession,
    items: &[LineItem],
  ) -> Result<(), RepositoryError> {
    for item in items {
      let stored = session
        .state
        .line_items
        .iter_mut()
        .find(|i| i.id == item.id && i.invoice_number == item.invoice_number)
        .ok_or(RepositoryError::NotFound)?;
      *stored = item.clone();
    }
    session.invalidate_after_commit(keys::LINE_ITEM_FAMILY);
    Ok(())
  }

  async fn delete_many(
    &self,
    session: &mut MemorySession,
    ids: &[Uuid],
  ) -> Result<(), RepositoryError> {
    session.state.line_items.retain(|i| !ids.contains(&i.id));
    session.invalidate_after_commit(keys::LINE_ITEM_FAMILY);
    Ok(())
  }
}

/// Deterministic ids: 00000000-0000-0000-0000-000000000001, ...02, ...
#[derive(Default)]
pub struct SequentialIdGenerator {
  next: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
  fn new_id(&self) -> Uuid {
    Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::SeqCst)) + 1)
  }
}
