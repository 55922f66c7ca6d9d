pub mod noop_cache;
pub mod redis_cache;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::time::Duration;

use crate::domain::invoice::errors::RepositoryError;

pub use noop_cache::NoOpCache;
pub use redis_cache::RedisCache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
  #[error("Redis error: {0}")]
  Redis(#[from] redis::RedisError),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// String key/value store holding serialized read results.
#[async_trait]
pub trait Cache: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
  async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
  async fn delete(&self, key: &str) -> Result<(), CacheError>;
  /// Atomically increments a counter, creating it at 1.
  async fn incr(&self, key: &str) -> Result<u64, CacheError>;
  /// Deletes every key matching a glob pattern and returns how many were removed.
  async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError>;
}

/// Cache key layout. Every key lives under one of the entity families so a
/// committed write can drop everything derived from that entity.
pub mod keys {
  use uuid::Uuid;

  use crate::domain::invoice::listing::{InvoiceFilter, InvoiceListQuery};
  use crate::domain::invoice::value_objects::InvoiceNumber;

  pub const INVOICE_FAMILY: &str = "invoice:invoices:*";
  pub const CUSTOMER_FAMILY: &str = "invoice:customers:*";
  pub const LINE_ITEM_FAMILY: &str = "invoice:items:*";

  pub fn invoice_page(query: &InvoiceListQuery) -> String {
    let encoded = serde_json::to_string(query).unwrap_or_else(|_| format!("{:?}", query));
    format!("invoice:invoices:getlist:{}", encoded)
  }

  pub fn invoice_count(filter: &InvoiceFilter) -> String {
    let encoded = serde_json::to_string(filter).unwrap_or_else(|_| format!("{:?}", filter));
    format!("invoice:invoices:getcount:{}", encoded)
  }

  pub fn invoice_detail(number: &InvoiceNumber) -> String {
    format!("invoice:invoices:getdetail:{}", number)
  }

  pub fn customer_detail(id: Uuid) -> String {
    format!("invoice:customers:getdetail:{}", id)
  }

  pub fn line_items_of(number: &InvoiceNumber) -> String {
    format!("invoice:items:invoiceid:{}", number)
  }

  /// Invalidation counter of the family a key or family pattern belongs to.
  /// Lives outside every family so `delete_matching` never resets it.
  pub fn generation_of(key: &str) -> String {
    let entity = key.split(':').nth(1).unwrap_or_default();
    format!("invoice:generation:{}", entity)
  }
}

/// Serves `key` from the cache, falling back to `load` on a miss.
///
/// Cache failures never fail the read: they are logged and the store is
/// consulted directly. Loaded values are written back with `ttl`.
///
/// A miss can load rows that a concurrent writer replaces before the value is
/// written back. The family generation is read before loading and again after
/// the write-back; if an invalidation ran in between, the entry is dropped
/// instead of serving the old rows until `ttl` expires.
pub async fn read_through<T, F, Fut>(
  cache: &dyn Cache,
  key: &str,
  ttl: Duration,
  load: F,
) -> Result<T, RepositoryError>
where
  T: Serialize + DeserializeOwned,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T, RepositoryError>>,
{
  match cache.get(key).await {
    Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
      Ok(value) => {
        tracing::debug!("Cache hit: {}", key);
        return Ok(value);
      }
      Err(e) => tracing::warn!("Discarding undecodable cache entry {}: {}", key, e),
    },
    Ok(None) => tracing::debug!("Cache miss: {}", key),
    Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
  }

  let generation_key = keys::generation_of(key);
  let generation = match cache.get(&generation_key).await {
    Ok(generation) => Some(generation),
    Err(e) => {
      tracing::warn!("Cache generation read failed for {}: {}", key, e);
      None
    }
  };

  let value = load().await?;

  if let Some(generation) = generation {
    write_back(cache, key, &generation_key, generation, &value, ttl).await;
  }

  Ok(value)
}

async fn write_back<T: Serialize>(
  cache: &dyn Cache,
  key: &str,
  generation_key: &str,
  generation: Option<String>,
  value: &T,
  ttl: Duration,
) {
  let raw = match serde_json::to_string(value) {
    Ok(raw) => raw,
    Err(e) => {
      tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
      return;
    }
  };

  if let Err(e) = cache.set(key, raw, ttl).await {
    tracing::warn!("Cache write failed for {}: {}", key, e);
    return;
  }

  let unchanged = matches!(cache.get(generation_key).await, Ok(current) if current == generation);
  if !unchanged {
    tracing::debug!("Family invalidated while loading {}, dropping entry", key);
    if let Err(e) = cache.delete(key).await {
      tracing::warn!("Failed to drop racing cache entry {}: {}", key, e);
    }
  }
}

/// Drops every cached entry of one family, logging instead of failing.
///
/// The family generation is bumped first so reads already in flight discard
/// what they loaded.
pub async fn invalidate_family(cache: &dyn Cache, family: &str) {
  if let Err(e) = cache.incr(&keys::generation_of(family)).await {
    tracing::warn!("Failed to bump cache generation of {}: {}", family, e);
  }

  match cache.delete_matching(family).await {
    Ok(removed) => tracing::debug!("Invalidated {} cache entries matching {}", removed, family),
    Err(e) => tracing::warn!("Failed to invalidate cache entries matching {}: {}", family, e),
  }
}
