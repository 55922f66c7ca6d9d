use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::input::InvoiceInput;
use crate::domain::invoice::{
  AtomicSessionProvider, InvoiceData, InvoiceError, InvoiceNumber, InvoiceService,
};

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceCommand {
  pub invoice_id: String,
  pub invoice: InvoiceInput,
}

#[derive(Debug, Serialize)]
pub struct UpdateInvoiceResponse {
  pub invoice_id: String,
}

pub struct UpdateInvoiceUseCase<P: AtomicSessionProvider> {
  invoice_service: Arc<InvoiceService<P>>,
}

impl<P: AtomicSessionProvider> UpdateInvoiceUseCase<P> {
  pub fn new(invoice_service: Arc<InvoiceService<P>>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: UpdateInvoiceCommand,
  ) -> Result<UpdateInvoiceResponse, InvoiceError> {
    let number = InvoiceNumber::new(command.invoice_id)?;
    let invoice_data = InvoiceData::try_from(command.invoice)?;

    let number = self
      .invoice_service
      .update_invoice(&number, invoice_data)
      .await?;

    Ok(UpdateInvoiceResponse {
      invoice_id: number.into_inner(),
    })
  }
}
