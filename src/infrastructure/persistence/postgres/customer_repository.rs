use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{PgSession, map_write_error};
use crate::domain::invoice::{
  Customer, CustomerName, errors::RepositoryError, ports::CustomerRepository,
};
use crate::infrastructure::cache::{Cache, keys, read_through};

#[derive(Debug, FromRow)]
struct CustomerRow {
  id: Uuid,
  name: String,
  address: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
  type Error = RepositoryError;

  fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
    let name = CustomerName::new(row.name)?;

    Ok(Customer {
      id: row.id,
      name,
      address: row.address,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

pub struct PostgresCustomerRepository {
  pool: PgPool,
  cache: Arc<dyn Cache>,
  ttl: Duration,
}

impl PostgresCustomerRepository {
  pub fn new(pool: PgPool, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
    Self { pool, cache, ttl }
  }
}

#[async_trait]
impl CustomerRepository<PgSession> for PostgresCustomerRepository {
  async fn create(
    &self,
    session: &mut PgSession,
    customer: &Customer,
  ) -> Result<(), RepositoryError> {
    sqlx::query(
      r#"
            INSERT INTO customers (id, name, address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
    )
    .bind(customer.id)
    .bind(customer.name.value())
    .bind(&customer.address)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(session.connection())
    .await
    .map_err(|e| map_write_error(e, "customer"))?;

    session.invalidate_after_commit(keys::CUSTOMER_FAMILY);
    Ok(())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError> {
    let pool = &self.pool;

    read_through(
      self.cache.as_ref(),
      &keys::customer_detail(id),
      self.ttl,
      move || async move {
        let row = sqlx::query_as::<_, CustomerRow>(
          r#"
                SELECT id, name, address, created_at, updated_at
                FROM customers
                WHERE id = $1 AND deleted_at IS NULL
                "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
      },
    )
    .await
  }

  async fn update(
    &self,
    session: &mut PgSession,
    customer: &Customer,
  ) -> Result<(), RepositoryError> {
    let result = sqlx::query(
      r#"
            UPDATE customers
            SET name = $2, address = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            "#,
    )
    .bind(customer.id)
    .bind(customer.name.value())
    .bind(&customer.address)
    .bind(customer.updated_at)
    .execute(session.connection())
    .await?;

    if result.rows_affected() == 0 {
      return Err(RepositoryError::NotFound);
    }

    session.invalidate_after_commit(keys::CUSTOMER_FAMILY);
    Ok(())
  }
}
