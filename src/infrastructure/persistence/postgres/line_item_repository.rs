use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{PgSession, map_write_error};
use crate::domain::invoice::{
  InvoiceNumber, LineItem, errors::RepositoryError, ports::LineItemRepository,
};
use crate::infrastructure::cache::{Cache, keys, read_through};

#[derive(Debug, FromRow)]
struct LineItemRow {
  id: Uuid,
  invoice_number: String,
  name: String,
  item_type: String,
  quantity: Decimal,
  unit_price: Decimal,
  amount: Decimal,
}

impl TryFrom<LineItemRow> for LineItem {
  type Error = RepositoryError;

  fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
    let invoice_number = InvoiceNumber::new(row.invoice_number)?;

    Ok(LineItem {
      id: row.id,
      invoice_number,
      name: row.name,
      item_type: row.item_type,
      quantity: row.quantity,
      unit_price: row.unit_price,
      amount: row.amount,
    })
  }
}

pub struct PostgresLineItemRepository {
  pool: PgPool,
  cache: Arc<dyn Cache>,
  ttl: Duration,
}

impl PostgresLineItemRepository {
  pub fn new(pool: PgPool, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
    Self { pool, cache, ttl }
  }
}

#[async_trait]
impl LineItemRepository<PgSession> for PostgresLineItemRepository {
  async fn create_many(
    &self,
    session: &mut PgSession,
    items: &[LineItem],
  ) -> Result<(), RepositoryError> {
    if items.is_empty() {
      return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
      "INSERT INTO items (id, invoice_number, name, item_type, quantity, unit_price, amount) ",
    );
    builder.push_values(items, |mut row, item| {
      row
        .push_bind(item.id)
        .push_bind(item.invoice_number.value().to_string())
        .push_bind(item.name.clone())
        .push_bind(item.item_type.clone())
        .push_bind(item.quantity)
        .push_bind(item.unit_price)
        .push_bind(item.amount);
    });

    builder
      .build()
      .execute(session.connection())
      .await
      .map_err(|e| map_write_error(e, "line item"))?;

    session.invalidate_after_commit(keys::LINE_ITEM_FAMILY);
    Ok(())
  }

  async fn find_by_invoice_number(
    &self,
    number: &InvoiceNumber,
  ) -> Result<Vec<LineItem>, RepositoryError> {
    let pool = &self.pool;

    read_through(
      self.cache.as_ref(),
      &keys::line_items_of(number),
      self.ttl,
      move || async move {
        let rows = sqlx::query_as::<_, LineItemRow>(
          r#"
                SELECT id, invoice_number, name, item_type, quantity, unit_price, amount
                FROM items
                WHERE invoice_number = $1 AND deleted_at IS NULL
                ORDER BY seq
                "#,
        )
        .bind(number.value())
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
      },
    )
    .await
  }

  async fn update_many(
    &self,
    session: &mut PgSession,
    items: &[LineItem],
  ) -> Result<(), RepositoryError> {
    for item in items {
      let result = sqlx::query(
        r#"
              UPDATE items
              SET name = $3, item_type = $4, quantity = $5, unit_price = $6,
                  amount = $7, updated_at = NOW()
              WHERE id = $1 AND invoice_number = $2 AND deleted_at IS NULL
              "#,
      )
      .bind(item.id)
      .bind(item.invoice_number.value())
      .bind(&item.name)
      .bind(&item.item_type)
      .bind(item.quantity)
      .bind(item.unit_price)
      .bind(item.amount)
      .execute(session.connection())
      .await?;

      if result.rows_affected() == 0 {
        tracing::debug!("Line item {} not found for update", item.id);
        return Err(RepositoryError::NotFound);
      }
    }

    session.invalidate_after_commit(keys::LINE_ITEM_FAMILY);
    Ok(())
  }

  async fn delete_many(
    &self,
    session: &mut PgSession,
    ids: &[Uuid],
  ) -> Result<(), RepositoryError> {
    sqlx::query(
      r#"
            UPDATE items
            SET deleted_at = NOW()
            WHERE id = ANY($1) AND deleted_at IS NULL
            "#,
    )
    .bind(ids)
    .execute(session.connection())
    .await?;

    session.invalidate_after_commit(keys::LINE_ITEM_FAMILY);
    Ok(())
  }
}
