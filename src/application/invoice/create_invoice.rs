use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::input::InvoiceInput;
use crate::domain::invoice::{AtomicSessionProvider, InvoiceData, InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceCommand {
  pub invoice: InvoiceInput,
}

#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
  pub invoice_id: String,
}

pub struct CreateInvoiceUseCase<P: AtomicSessionProvider> {
  invoice_service: Arc<InvoiceService<P>>,
}

impl<P: AtomicSessionProvider> CreateInvoiceUseCase<P> {
  pub fn new(invoice_service: Arc<InvoiceService<P>>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: CreateInvoiceCommand,
  ) -> Result<CreateInvoiceResponse, InvoiceError> {
    let invoice_data = InvoiceData::try_from(command.invoice)?;

    let invoice = self.invoice_service.create_invoice(invoice_data).await?;

    Ok(CreateInvoiceResponse {
      invoice_id: invoice.number.into_inner(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::application::invoice::input::fixtures::{invoice_input, line_item};
  use crate::domain::invoice::InvoiceServiceDependencies;
  use crate::infrastructure::persistence::memory::{
    MemorySessionProvider, MemoryStore, SequentialIdGenerator,
  };

  fn use_case(store: &MemoryStore) -> CreateInvoiceUseCase<MemorySessionProvider> {
    CreateInvoiceUseCase::new(Arc::new(InvoiceService::new(InvoiceServiceDependencies {
      invoice_repo: Arc::new(store.invoices()),
      customer_repo: Arc::new(store.customers()),
      line_item_repo: Arc::new(store.line_items()),
      sessions: Arc::new(store.session_provider()),
      id_generator: Arc::new(SequentialIdGenerator::default()),
    })))
  }

  #[tokio::test]
  async fn test_create_returns_invoice_number() {
    let store = MemoryStore::default();
    let use_case = use_case(&store);

    let response = use_case
      .execute(CreateInvoiceCommand {
        invoice: invoice_input("rent", vec![line_item(None, "desk")]),
      })
      .await
      .unwrap();

    assert_eq!(response.invoice_id, "0001");
    assert_eq!(store.line_item_rows().len(), 1);
  }

  #[tokio::test]
  async fn test_create_with_bad_date_writes_nothing() {
    let store = MemoryStore::default();
    let use_case = use_case(&store);
    let mut invoice = invoice_input("rent", vec![line_item(None, "desk")]);
    invoice.issue_date = "31/01/2024".to_string();

    let result = use_case.execute(CreateInvoiceCommand { invoice }).await;

    assert!(matches!(result, Err(InvoiceError::Validation(_))));
    assert!(store.invoice_rows().is_empty());
  }

  #[tokio::test]
  async fn test_create_without_items() {
    let store = MemoryStore::default();
    let use_case = use_case(&store);

    let response = use_case
      .execute(CreateInvoiceCommand {
        invoice: invoice_input("empty", vec![]),
      })
      .await
      .unwrap();

    assert_eq!(response.invoice_id, "0001");
    assert_eq!(store.invoice_rows()[0].total_items, 0);
  }
}
