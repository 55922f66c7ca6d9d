use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::invoice::errors::RepositoryError;
use crate::domain::invoice::ports::AtomicSessionProvider;
use crate::infrastructure::cache::{Cache, invalidate_family};

/// One database transaction plus the cache families its writes touched
pub struct PgSession {
  tx: Transaction<'static, Postgres>,
  invalidations: Vec<&'static str>,
}

impl PgSession {
  pub fn connection(&mut self) -> &mut PgConnection {
    &mut self.tx
  }

  /// Queues a cache family to be dropped once this session commits.
  pub fn invalidate_after_commit(&mut self, family: &'static str) {
    if !self.invalidations.contains(&family) {
      self.invalidations.push(family);
    }
  }
}

/// PostgreSQL transactions as units of work
pub struct PostgresSessionProvider {
  pool: PgPool,
  cache: Arc<dyn Cache>,
}

impl PostgresSessionProvider {
  pub fn new(pool: PgPool, cache: Arc<dyn Cache>) -> Self {
    Self { pool, cache }
  }
}

#[async_trait]
impl AtomicSessionProvider for PostgresSessionProvider {
  type Session = PgSession;

  async fn begin(&self) -> Result<PgSession, RepositoryError> {
    let tx = self.pool.begin().await.map_err(|e| {
      tracing::error!("Failed to begin transaction: {}", e);
      RepositoryError::Database(e)
    })?;

    Ok(PgSession {
      tx,
      invalidations: Vec::new(),
    })
  }

  async fn commit(&self, session: PgSession) -> Result<(), RepositoryError> {
    let PgSession { tx, invalidations } = session;

    tx.commit().await.map_err(|e| {
      tracing::error!("Failed to commit transaction: {}", e);
      RepositoryError::Database(e)
    })?;

    // cached reads are only dropped once the writes are visible
    for family in invalidations {
      invalidate_family(self.cache.as_ref(), family).await;
    }

    Ok(())
  }

  async fn rollback(&self, session: PgSession) -> Result<(), RepositoryError> {
    session.tx.rollback().await.map_err(|e| {
      tracing::error!("Failed to roll back transaction: {}", e);
      RepositoryError::Database(e)
    })
  }
}
