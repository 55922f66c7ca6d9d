use actix_web::{HttpResponse, web};
use std::sync::Arc;
use validator::Validate;

use crate::adapters::http::{
  dtos::{HealthResponse, InvoiceIdResponse, InvoiceRequest, ListInvoicesQuery},
  errors::ApiError,
};
use crate::application::invoice::{
  CreateInvoiceCommand, CreateInvoiceUseCase, GetInvoiceDetailsCommand, GetInvoiceDetailsUseCase,
  ListInvoicesUseCase, UpdateInvoiceCommand, UpdateInvoiceUseCase,
};
use crate::domain::invoice::AtomicSessionProvider;

/// Handler for invoice creation
///
/// POST /invoice/v1
/// Body: InvoiceRequest (JSON)
/// Response: InvoiceIdResponse (JSON) with status 201
pub async fn create_invoice_handler<P: AtomicSessionProvider + 'static>(
  request: web::Json<InvoiceRequest>,
  use_case: web::Data<Arc<CreateInvoiceUseCase<P>>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let command = CreateInvoiceCommand {
    invoice: request.into_inner().into(),
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Created().json(InvoiceIdResponse {
    invoice_id: response.invoice_id,
  }))
}

/// PATCH /invoice/v1/{id}
pub async fn update_invoice_handler<P: AtomicSessionProvider + 'static>(
  path: web::Path<String>,
  request: web::Json<InvoiceRequest>,
  use_case: web::Data<Arc<UpdateInvoiceUseCase<P>>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let command = UpdateInvoiceCommand {
    invoice_id: path.into_inner(),
    invoice: request.into_inner().into(),
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Ok().json(InvoiceIdResponse {
    invoice_id: response.invoice_id,
  }))
}

/// GET /invoice/v1?page=&limit=&invoice_id=&issue_date=&subject=&total_item=&customer=&due_date=&status=
pub async fn list_invoices_handler<P: AtomicSessionProvider + 'static>(
  query: web::Query<ListInvoicesQuery>,
  use_case: web::Data<Arc<ListInvoicesUseCase<P>>>,
) -> Result<HttpResponse, ApiError> {
  query.validate()?;

  let response = use_case.execute(query.into_inner().into()).await?;

  Ok(HttpResponse::Ok().json(response))
}

/// GET /invoice/v1/{id}
pub async fn get_invoice_handler<P: AtomicSessionProvider + 'static>(
  path: web::Path<String>,
  use_case: web::Data<Arc<GetInvoiceDetailsUseCase<P>>>,
) -> Result<HttpResponse, ApiError> {
  let command = GetInvoiceDetailsCommand {
    invoice_id: path.into_inner(),
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Ok().json(response))
}

/// GET /health
pub async fn health_handler() -> HttpResponse {
  HttpResponse::Ok().json(HealthResponse {
    status: "ok".to_string(),
  })
}

#[cfg(test)]
mod tests {
  use crate::adapters::http::routes::{InvoiceRouteDependencies, configure_invoice_routes};
  use crate::domain::invoice::{InvoiceService, InvoiceServiceDependencies};
  use crate::infrastructure::persistence::memory::{
    MemorySessionProvider, MemoryStore, SequentialIdGenerator,
  };
  use actix_web::{
    App,
    http::StatusCode,
    test::{self, TestRequest},
  };
  use serde_json::{Value, json};
  use std::sync::Arc;

  fn dependencies(store: &MemoryStore) -> InvoiceRouteDependencies<MemorySessionProvider> {
    InvoiceRouteDependencies::new(Arc::new(InvoiceService::new(InvoiceServiceDependencies {
      invoice_repo: Arc::new(store.invoices()),
      customer_repo: Arc::new(store.customers()),
      line_item_repo: Arc::new(store.line_items()),
      sessions: Arc::new(store.session_provider()),
      id_generator: Arc::new(SequentialIdGenerator::default()),
    })))
  }

  fn body(subject: &str, items: Value) -> Value {
    json!({
      "subject": subject,
      "issue_date": "01-02-2024",
      "due_date": "01-03-2024",
      "sub_total": 200,
      "tax": 20,
      "grand_total": 220,
      "customer_request": { "customer_name": "ACME", "address": "1 Main Street" },
      "item_request": items
    })
  }

  fn two_items() -> Value {
    json!([
      { "name": "desk", "type": "goods", "quantity": 1, "unit_price": 150, "amount": 150 },
      { "name": "lamp", "type": "goods", "quantity": 1, "unit_price": 50, "amount": 50 }
    ])
  }

  #[actix_web::test]
  async fn test_create_and_fetch_invoice() {
    let store = MemoryStore::default();
    let app = test::init_service(
      App::new().configure(|cfg| configure_invoice_routes(cfg, dependencies(&store))),
    )
    .await;

    let req = TestRequest::post()
      .uri("/invoice/v1")
      .set_json(body("Office Setup", two_items()))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["invoice_id"], "0001");

    let req = TestRequest::get().uri("/invoice/v1/0001").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: Value = test::read_body_json(resp).await;
    assert_eq!(detail["subject"], "office setup");
    assert_eq!(detail["customer"]["name"], "acme");
    assert_eq!(detail["issue_date"], "01-02-2024");
    assert_eq!(detail["status"], "Unpaid");
    assert_eq!(detail["items"].as_array().map(Vec::len), Some(2));
  }

  #[actix_web::test]
  async fn test_create_rejects_invalid_subject() {
    let store = MemoryStore::default();
    let app = test::init_service(
      App::new().configure(|cfg| configure_invoice_routes(cfg, dependencies(&store))),
    )
    .await;

    let req = TestRequest::post()
      .uri("/invoice/v1")
      .set_json(body("rent?", two_items()))
      .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error"], "validation_error");
    assert!(store.invoice_rows().is_empty());
  }

  #[actix_web::test]
  async fn test_create_rejects_malformed_date() {
    let store = MemoryStore::default();
    let app = test::init_service(
      App::new().configure(|cfg| configure_invoice_routes(cfg, dependencies(&store))),
    )
    .await;

    let mut payload = body("rent", two_items());
    payload["due_date"] = json!("2024-03-01");
    let req = TestRequest::post()
      .uri("/invoice/v1")
      .set_json(payload)
      .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[actix_web::test]
  async fn test_missing_invoice_is_unprocessable() {
    let store = MemoryStore::default();
    let app = test::init_service(
      App::new().configure(|cfg| configure_invoice_routes(cfg, dependencies(&store))),
    )
    .await;

    let req = TestRequest::get().uri("/invoice/v1/0404").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = TestRequest::patch()
      .uri("/invoice/v1/0404")
      .set_json(body("rent", two_items()))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[actix_web::test]
  async fn test_update_drops_removed_items() {
    let store = MemoryStore::default();
    let app = test::init_service(
      App::new().configure(|cfg| configure_invoice_routes(cfg, dependencies(&store))),
    )
    .await;

    let req = TestRequest::post()
      .uri("/invoice/v1")
      .set_json(body("setup", two_items()))
      .to_request();
    test::call_service(&app, req).await;
    let kept = store.line_item_rows()[0].id;

    let items = json!([
      {
        "item_id": kept,
        "name": "standing desk",
        "type": "goods",
        "quantity": 1,
        "unit_price": 300,
        "amount": 300
      }
    ]);
    let req = TestRequest::patch()
      .uri("/invoice/v1/0001")
      .set_json(body("setup", items))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["invoice_id"], "0001");

    let rows = store.line_item_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "standing desk");
  }

  #[actix_web::test]
  async fn test_list_invoices_with_pagination() {
    let store = MemoryStore::default();
    let app = test::init_service(
      App::new().configure(|cfg| configure_invoice_routes(cfg, dependencies(&store))),
    )
    .await;

    for subject in ["rent", "power", "rent"] {
      let req = TestRequest::post()
        .uri("/invoice/v1")
        .set_json(body(subject, two_items()))
        .to_request();
      test::call_service(&app, req).await;
    }

    let req = TestRequest::get()
      .uri("/invoice/v1?page=1&limit=2")
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(page["pagination"]["total_page"], 2);
    assert_eq!(page["pagination"]["total_data"], 3);

    let req = TestRequest::get()
      .uri("/invoice/v1?subject=RENT")
      .to_request();
    let resp = test::call_service(&app, req).await;
    let filtered: Value = test::read_body_json(resp).await;
    assert_eq!(filtered["pagination"]["total_data"], 2);

    let req = TestRequest::get().uri("/invoice/v1?page=0").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[actix_web::test]
  async fn test_health() {
    let store = MemoryStore::default();
    let app = test::init_service(
      App::new().configure(|cfg| configure_invoice_routes(cfg, dependencies(&store))),
    )
    .await;

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
