use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::entities::{
  Customer, Invoice, InvoiceHeader, InvoiceSummary, LineItem, LineItemData,
};
use super::errors::{InvoiceError, RepositoryError};
use super::listing::{InvoiceListQuery, Pagination};
use super::numbering::next_invoice_number;
use super::ports::{
  AtomicSessionProvider, CustomerRepository, IdGenerator, InvoiceRepository, LineItemRepository,
};
use super::reconcile::items_to_delete;
use super::value_objects::{CustomerName, InvoiceNumber};

/// Invoice creation and update data
pub struct InvoiceData {
  pub header: InvoiceHeader,
  pub customer_name: CustomerName,
  pub customer_address: String,
  pub line_items: Vec<LineItemData>,
}

pub struct InvoiceServiceDependencies<P: AtomicSessionProvider> {
  pub invoice_repo: Arc<dyn InvoiceRepository<P::Session>>,
  pub customer_repo: Arc<dyn CustomerRepository<P::Session>>,
  pub line_item_repo: Arc<dyn LineItemRepository<P::Session>>,
  pub sessions: Arc<P>,
  pub id_generator: Arc<dyn IdGenerator>,
}

/// Line item writes derived from an update request
#[derive(Debug, Default, PartialEq)]
struct LineItemChanges {
  delete: Vec<Uuid>,
  update: Vec<LineItem>,
  create: Vec<LineItem>,
}

pub struct InvoiceService<P: AtomicSessionProvider> {
  invoice_repo: Arc<dyn InvoiceRepository<P::Session>>,
  customer_repo: Arc<dyn CustomerRepository<P::Session>>,
  line_item_repo: Arc<dyn LineItemRepository<P::Session>>,
  sessions: Arc<P>,
  id_generator: Arc<dyn IdGenerator>,
}

impl<P: AtomicSessionProvider> InvoiceService<P> {
  pub fn new(deps: InvoiceServiceDependencies<P>) -> Self {
    Self {
      invoice_repo: deps.invoice_repo,
      customer_repo: deps.customer_repo,
      line_item_repo: deps.line_item_repo,
      sessions: deps.sessions,
      id_generator: deps.id_generator,
    }
  }

  /// Creates a customer, an invoice numbered after the current maximum, and
  /// its line items as one unit of work.
  pub async fn create_invoice(&self, data: InvoiceData) -> Result<Invoice, InvoiceError> {
    let latest = match self.invoice_repo.latest_number().await {
      Ok(latest) => latest,
      Err(RepositoryError::NotFound) => None,
      Err(e) => {
        tracing::error!("Failed to read latest invoice number: {}", e);
        return Err(e.into());
      }
    };

    let number = next_invoice_number(latest.as_deref().unwrap_or_default()).map_err(|e| {
      tracing::error!("Stored invoice number is unusable: {}", e);
      RepositoryError::CorruptRecord(e.to_string())
    })?;

    let customer = Customer::new(
      self.id_generator.new_id(),
      data.customer_name,
      data.customer_address,
    );
    let invoice = Invoice::new(
      number.clone(),
      customer.id,
      data.header,
      data.line_items.len(),
    );
    let line_items: Vec<LineItem> = data
      .line_items
      .into_iter()
      .map(|item| LineItem::new(self.id_generator.new_id(), number.clone(), item))
      .collect();

    let mut session = self.begin().await?;
    let result = self
      .write_new_invoice(&mut session, &customer, &invoice, &line_items)
      .await;
    let created = self.finish(session, result).await?;

    tracing::info!(
      "Created invoice {} with {} line item(s)",
      created.number,
      line_items.len()
    );
    Ok(created)
  }

  /// One page of invoices matching the query, with pagination metadata.
  pub async fn list_invoices(
    &self,
    query: &InvoiceListQuery,
  ) -> Result<(Vec<InvoiceSummary>, Pagination), InvoiceError> {
    let invoices = self.invoice_repo.find_page(query).await.map_err(|e| {
      tracing::error!("Failed to list invoices: {}", e);
      e
    })?;

    let count = self.invoice_repo.count(&query.filter).await.map_err(|e| {
      tracing::error!("Failed to count invoices: {}", e);
      e
    })?;

    Ok((invoices, Pagination::new(query.page, query.limit, count)))
  }

  pub async fn get_invoice_with_details(
    &self,
    number: &InvoiceNumber,
  ) -> Result<(Invoice, Customer, Vec<LineItem>), InvoiceError> {
    let invoice = self.load_invoice(number).await?;
    let customer = self.load_customer(invoice.customer_id).await?;
    let line_items = self.load_line_items(&invoice.number).await?;

    Ok((invoice, customer, line_items))
  }

  /// Rewrites the invoice header, its customer and its line items as one unit
  /// of work.
  ///
  /// Stored items are only deleted when the request carries fewer items than
  /// are stored. Requested items that carry a stored item's id update that
  /// item; items without an id are created.
  pub async fn update_invoice(
    &self,
    number: &InvoiceNumber,
    data: InvoiceData,
  ) -> Result<InvoiceNumber, InvoiceError> {
    let mut invoice = self.load_invoice(number).await?;
    let mut customer = self.load_customer(invoice.customer_id).await?;
    let current_items = self.load_line_items(&invoice.number).await?;

    invoice.revise(data.header, data.line_items.len());
    customer.update(data.customer_name, data.customer_address);

    let changes = self.plan_line_item_changes(&invoice.number, &current_items, data.line_items)?;

    let mut session = self.begin().await?;
    let result = self
      .write_revision(&mut session, &customer, &invoice, &changes)
      .await;
    self.finish(session, result).await?;

    tracing::info!(
      "Updated invoice {}: {} item(s) updated, {} created, {} deleted",
      invoice.number,
      changes.update.len(),
      changes.create.len(),
      changes.delete.len()
    );
    Ok(invoice.number)
  }

  fn plan_line_item_changes(
    &self,
    number: &InvoiceNumber,
    current_items: &[LineItem],
    requested: Vec<LineItemData>,
  ) -> Result<LineItemChanges, InvoiceError> {
    let current_ids: Vec<Uuid> = current_items.iter().map(|item| item.id).collect();
    let requested_ids: Vec<Uuid> = requested.iter().filter_map(|item| item.id).collect();

    let mut seen = HashSet::with_capacity(requested_ids.len());
    for id in &requested_ids {
      if !current_ids.contains(id) {
        return Err(InvoiceError::InvalidLineItems(format!(
          "Line item {} does not belong to invoice {}",
          id, number
        )));
      }
      if !seen.insert(*id) {
        return Err(InvoiceError::InvalidLineItems(format!(
          "Line item {} is listed more than once",
          id
        )));
      }
    }

    let delete = if current_ids.len() > requested.len() {
      items_to_delete(&current_ids, &requested_ids)
    } else {
      Vec::new()
    };

    let mut changes = LineItemChanges {
      delete,
      ..LineItemChanges::default()
    };
    for item in requested {
      match item.id {
        Some(id) => changes
          .update
          .push(LineItem::new(id, number.clone(), item)),
        None => changes.create.push(LineItem::new(
          self.id_generator.new_id(),
          number.clone(),
          item,
        )),
      }
    }

    Ok(changes)
  }

  async fn write_new_invoice(
    &self,
    session: &mut P::Session,
    customer: &Customer,
    invoice: &Invoice,
    line_items: &[LineItem],
  ) -> Result<Invoice, InvoiceError> {
    self
      .customer_repo
      .create(session, customer)
      .await
      .map_err(|e| {
        tracing::error!("Failed to create customer {}: {}", customer.id, e);
        e
      })?;

    let created = self
      .invoice_repo
      .create(session, invoice)
      .await
      .map_err(|e| {
        tracing::error!("Failed to create invoice {}: {}", invoice.number, e);
        e
      })?;

    self
      .line_item_repo
      .create_many(session, line_items)
      .await
      .map_err(|e| {
        tracing::error!(
          "Failed to create line items for invoice {}: {}",
          invoice.number,
          e
        );
        e
      })?;

    Ok(created)
  }

  async fn write_revision(
    &self,
    session: &mut P::Session,
    customer: &Customer,
    invoice: &Invoice,
    changes: &LineItemChanges,
  ) -> Result<(), InvoiceError> {
    if !changes.delete.is_empty() {
      self
        .line_item_repo
        .delete_many(session, &changes.delete)
        .await
        .map_err(|e| {
          tracing::error!(
            "Failed to delete line items of invoice {}: {}",
            invoice.number,
            e
          );
          e
        })?;
    }

    self
      .customer_repo
      .update(session, customer)
      .await
      .map_err(|e| {
        tracing::error!("Failed to update customer {}: {}", customer.id, e);
        e
      })?;

    self
      .invoice_repo
      .update(session, invoice)
      .await
      .map_err(|e| {
        tracing::error!("Failed to update invoice {}: {}", invoice.number, e);
        e
      })?;

    self
      .line_item_repo
      .update_many(session, &changes.update)
      .await
      .map_err(|e| {
        tracing::error!(
          "Failed to update line items of invoice {}: {}",
          invoice.number,
          e
        );
        e
      })?;

    if !changes.create.is_empty() {
      self
        .line_item_repo
        .create_many(session, &changes.create)
        .await
        .map_err(|e| {
          tracing::error!(
            "Failed to add line items to invoice {}: {}",
            invoice.number,
            e
          );
          e
        })?;
    }

    Ok(())
  }

  // Helper methods
  async fn load_invoice(&self, number: &InvoiceNumber) -> Result<Invoice, InvoiceError> {
    match self.invoice_repo.find_by_number(number).await {
      Ok(Some(invoice)) => Ok(invoice),
      Ok(None) | Err(RepositoryError::NotFound) => {
        tracing::debug!("Invoice {} not found", number);
        Err(InvoiceError::InvoiceNotFound(number.to_string()))
      }
      Err(e) => {
        tracing::error!("Failed to load invoice {}: {}", number, e);
        Err(e.into())
      }
    }
  }

  async fn load_customer(&self, id: Uuid) -> Result<Customer, InvoiceError> {
    match self.customer_repo.find_by_id(id).await {
      Ok(Some(customer)) => Ok(customer),
      Ok(None) | Err(RepositoryError::NotFound) => {
        tracing::warn!("Customer {} referenced by an invoice is missing", id);
        Err(InvoiceError::CustomerNotFound(id))
      }
      Err(e) => {
        tracing::error!("Failed to load customer {}: {}", id, e);
        Err(e.into())
      }
    }
  }

  async fn load_line_items(&self, number: &InvoiceNumber) -> Result<Vec<LineItem>, InvoiceError> {
    match self.line_item_repo.find_by_invoice_number(number).await {
      Ok(items) => Ok(items),
      Err(RepositoryError::NotFound) => Err(InvoiceError::InvoiceNotFound(number.to_string())),
      Err(e) => {
        tracing::error!("Failed to load line items of invoice {}: {}", number, e);
        Err(e.into())
      }
    }
  }

  async fn begin(&self) -> Result<P::Session, InvoiceError> {
    self.sessions.begin().await.map_err(|e| {
      tracing::error!("Failed to begin unit of work: {}", e);
      InvoiceError::Transaction(e.to_string())
    })
  }

  /// Commits on success; otherwise rolls back and hands back the original error.
  async fn finish<T>(
    &self,
    session: P::Session,
    result: Result<T, InvoiceError>,
  ) -> Result<T, InvoiceError> {
    match result {
      Ok(value) => {
        self.sessions.commit(session).await.map_err(|e| {
          tracing::error!("Failed to commit unit of work: {}", e);
          InvoiceError::Transaction(e.to_string())
        })?;
        Ok(value)
      }
      Err(e) => {
        if let Err(rollback_err) = self.sessions.rollback(session).await {
          tracing::error!("Failed to roll back unit of work: {}", rollback_err);
        }
        Err(e)
      }
    }
  }
}
