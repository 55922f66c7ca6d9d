use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{PgSession, map_write_error};
use crate::domain::invoice::{
  Invoice, InvoiceFilter, InvoiceListQuery, InvoiceNumber, InvoiceStatus, InvoiceSummary,
  errors::RepositoryError, ports::InvoiceRepository,
};
use crate::infrastructure::cache::{Cache, keys, read_through};

const INVOICE_COLUMNS: &str = "i.invoice_number, i.issue_date, i.due_date, i.subject, \
  i.total_items, i.customer_id, i.status, i.sub_total, i.tax, i.grand_total, \
  i.created_at, i.updated_at";

#[derive(Debug, FromRow)]
struct InvoiceRow {
  invoice_number: String,
  issue_date: NaiveDate,
  due_date: NaiveDate,
  subject: String,
  total_items: i32,
  customer_id: Uuid,
  status: String,
  sub_total: Decimal,
  tax: Decimal,
  grand_total: Decimal,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct InvoiceSummaryRow {
  #[sqlx(flatten)]
  invoice: InvoiceRow,
  customer_name: String,
}

impl TryFrom<InvoiceRow> for Invoice {
  type Error = RepositoryError;

  fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
    let number = InvoiceNumber::new(row.invoice_number)?;
    let status = InvoiceStatus::from_str(&row.status)?;

    Ok(Invoice {
      number,
      issue_date: row.issue_date,
      due_date: row.due_date,
      subject: row.subject,
      total_items: row.total_items,
      customer_id: row.customer_id,
      status,
      subtotal: row.sub_total,
      tax: row.tax,
      grand_total: row.grand_total,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

impl TryFrom<InvoiceSummaryRow> for InvoiceSummary {
  type Error = RepositoryError;

  fn try_from(row: InvoiceSummaryRow) -> Result<Self, Self::Error> {
    Ok(InvoiceSummary {
      invoice: row.invoice.try_into()?,
      customer_name: row.customer_name,
    })
  }
}

/// Appends one `AND column = $n` per filter field that is set.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &InvoiceFilter) {
  if let Some(number) = &filter.invoice_number {
    builder
      .push(" AND i.invoice_number = ")
      .push_bind(number.value().to_string());
  }
  if let Some(issue_date) = filter.issue_date {
    builder.push(" AND i.issue_date = ").push_bind(issue_date);
  }
  if let Some(subject) = &filter.subject {
    builder.push(" AND i.subject = ").push_bind(subject.clone());
  }
  if let Some(total_items) = filter.total_items {
    builder.push(" AND i.total_items = ").push_bind(total_items);
  }
  if let Some(customer_name) = &filter.customer_name {
    builder.push(" AND c.name = ").push_bind(customer_name.clone());
  }
  if let Some(due_date) = filter.due_date {
    builder.push(" AND i.due_date = ").push_bind(due_date);
  }
  if let Some(status) = filter.status {
    builder.push(" AND i.status = ").push_bind(status.as_str());
  }
}

pub struct PostgresInvoiceRepository {
  pool: PgPool,
  cache: Arc<dyn Cache>,
  ttl: Duration,
}

impl PostgresInvoiceRepository {
  pub fn new(pool: PgPool, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
    Self { pool, cache, ttl }
  }
}

#[async_trait]
impl InvoiceRepository<PgSession> for PostgresInvoiceRepository {
  async fn create(
    &self,
    session: &mut PgSession,
    invoice: &Invoice,
  ) -> Result<Invoice, RepositoryError> {
    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            INSERT INTO invoices (
                invoice_number, issue_date, due_date, subject, total_items,
                customer_id, status, sub_total, tax, grand_total,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING invoice_number, issue_date, due_date, subject, total_items,
                      customer_id, status, sub_total, tax, grand_total,
                      created_at, updated_at
            "#,
    )
    .bind(invoice.number.value())
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(&invoice.subject)
    .bind(invoice.total_items)
    .bind(invoice.customer_id)
    .bind(invoice.status.as_str())
    .bind(invoice.subtotal)
    .bind(invoice.tax)
    .bind(invoice.grand_total)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .fetch_one(session.connection())
    .await
    .map_err(|e| map_write_error(e, "invoice"))?;

    session.invalidate_after_commit(keys::INVOICE_FAMILY);
    row.try_into()
  }

  async fn find_page(
    &self,
    query: &InvoiceListQuery,
  ) -> Result<Vec<InvoiceSummary>, RepositoryError> {
    let pool = &self.pool;

    read_through(
      self.cache.as_ref(),
      &keys::invoice_page(query),
      self.ttl,
      move || async move {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(INVOICE_COLUMNS);
        builder.push(
          ", c.name AS customer_name \
           FROM invoices i JOIN customers c ON c.id = i.customer_id \
           WHERE i.deleted_at IS NULL",
        );
        push_filter(&mut builder, &query.filter);
        builder
          .push(" ORDER BY LENGTH(i.invoice_number) DESC, i.invoice_number DESC LIMIT ")
          .push_bind(i64::from(query.limit))
          .push(" OFFSET ")
          .push_bind(query.offset());

        let rows = builder
          .build_query_as::<InvoiceSummaryRow>()
          .fetch_all(pool)
          .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
      },
    )
    .await
  }

  async fn count(&self, filter: &InvoiceFilter) -> Result<i64, RepositoryError> {
    let pool = &self.pool;

    read_through(
      self.cache.as_ref(),
      &keys::invoice_count(filter),
      self.ttl,
      move || async move {
        let mut builder = QueryBuilder::<Postgres>::new(
          "SELECT COUNT(*) FROM invoices i JOIN customers c ON c.id = i.customer_id \
           WHERE i.deleted_at IS NULL",
        );
        push_filter(&mut builder, filter);

        let count: i64 = builder.build_query_scalar().fetch_one(pool).await?;
        Ok(count)
      },
    )
    .await
  }

  async fn find_by_number(
    &self,
    number: &InvoiceNumber,
  ) -> Result<Option<Invoice>, RepositoryError> {
    let pool = &self.pool;

    read_through(
      self.cache.as_ref(),
      &keys::invoice_detail(number),
      self.ttl,
      move || async move {
        let row = sqlx::query_as::<_, InvoiceRow>(
          r#"
                SELECT invoice_number, issue_date, due_date, subject, total_items,
                       customer_id, status, sub_total, tax, grand_total,
                       created_at, updated_at
                FROM invoices
                WHERE invoice_number = $1 AND deleted_at IS NULL
                "#,
        )
        .bind(number.value())
        .fetch_optional(pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
      },
    )
    .await
  }

  // Deleted invoices still hold their number, so they are not excluded here.
  async fn latest_number(&self) -> Result<Option<String>, RepositoryError> {
    let latest = sqlx::query_scalar::<_, String>(
      r#"
            SELECT invoice_number
            FROM invoices
            ORDER BY LENGTH(invoice_number) DESC, invoice_number DESC
            LIMIT 1
            "#,
    )
    .fetch_optional(&self.pool)
    .await?;

    Ok(latest)
  }

  async fn update(
    &self,
    session: &mut PgSession,
    invoice: &Invoice,
  ) -> Result<(), RepositoryError> {
    let result = sqlx::query(
      r#"
            UPDATE invoices
            SET issue_date = $2, due_date = $3, subject = $4, total_items = $5,
                sub_total = $6, tax = $7, grand_total = $8, updated_at = $9
            WHERE invoice_number = $1 AND deleted_at IS NULL
            "#,
    )
    .bind(invoice.number.value())
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(&invoice.subject)
    .bind(invoice.total_items)
    .bind(invoice.subtotal)
    .bind(invoice.tax)
    .bind(invoice.grand_total)
    .bind(invoice.updated_at)
    .execute(session.connection())
    .await?;

    if result.rows_affected() == 0 {
      return Err(RepositoryError::NotFound);
    }

    session.invalidate_after_commit(keys::INVOICE_FAMILY);
    Ok(())
  }
}
