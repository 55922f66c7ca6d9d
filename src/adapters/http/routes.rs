use actix_web::web;
use std::sync::Arc;

use crate::application::invoice::{
  CreateInvoiceUseCase, GetInvoiceDetailsUseCase, ListInvoicesUseCase, UpdateInvoiceUseCase,
};
use crate::domain::invoice::{AtomicSessionProvider, InvoiceService};

use super::handlers::invoices::{
  create_invoice_handler, get_invoice_handler, health_handler, list_invoices_handler,
  update_invoice_handler,
};

/// Use cases served by the invoice routes
pub struct InvoiceRouteDependencies<P: AtomicSessionProvider> {
  pub create_invoice_use_case: Arc<CreateInvoiceUseCase<P>>,
  pub update_invoice_use_case: Arc<UpdateInvoiceUseCase<P>>,
  pub list_invoices_use_case: Arc<ListInvoicesUseCase<P>>,
  pub get_invoice_details_use_case: Arc<GetInvoiceDetailsUseCase<P>>,
}

impl<P: AtomicSessionProvider> InvoiceRouteDependencies<P> {
  /// Builds every use case on top of one shared service.
  pub fn new(invoice_service: Arc<InvoiceService<P>>) -> Self {
    Self {
      create_invoice_use_case: Arc::new(CreateInvoiceUseCase::new(invoice_service.clone())),
      update_invoice_use_case: Arc::new(UpdateInvoiceUseCase::new(invoice_service.clone())),
      list_invoices_use_case: Arc::new(ListInvoicesUseCase::new(invoice_service.clone())),
      get_invoice_details_use_case: Arc::new(GetInvoiceDetailsUseCase::new(invoice_service)),
    }
  }
}

impl<P: AtomicSessionProvider> Clone for InvoiceRouteDependencies<P> {
  fn clone(&self) -> Self {
    Self {
      create_invoice_use_case: self.create_invoice_use_case.clone(),
      update_invoice_use_case: self.update_invoice_use_case.clone(),
      list_invoices_use_case: self.list_invoices_use_case.clone(),
      get_invoice_details_use_case: self.get_invoice_details_use_case.clone(),
    }
  }
}

/// Configure invoice routes
///
/// # Routes
///
/// - GET /health - Liveness probe
/// - POST /invoice/v1 - Create an invoice with its customer and line items
/// - GET /invoice/v1 - Filtered, paginated invoice list
/// - GET /invoice/v1/{id} - Invoice with customer and line items
/// - PATCH /invoice/v1/{id} - Rewrite an invoice, its customer and line items
pub fn configure_invoice_routes<P: AtomicSessionProvider + 'static>(
  cfg: &mut web::ServiceConfig,
  deps: InvoiceRouteDependencies<P>,
) {
  cfg.route("/health", web::get().to(health_handler));

  cfg.service(
    web::scope("/invoice/v1")
      .app_data(web::Data::new(deps.create_invoice_use_case))
      .app_data(web::Data::new(deps.update_invoice_use_case))
      .app_data(web::Data::new(deps.list_invoices_use_case))
      .app_data(web::Data::new(deps.get_invoice_details_use_case))
      .route("", web::post().to(create_invoice_handler::<P>))
      .route("", web::get().to(list_invoices_handler::<P>))
      .route("/{id}", web::get().to(get_invoice_handler::<P>))
      .route("/{id}", web::patch().to(update_invoice_handler::<P>)),
  );
}
