use async_trait::async_trait;
use std::time::Duration;

use super::{Cache, CacheError};

/// Cache that stores nothing. Used when caching is disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCache;

#[async_trait]
impl Cache for NoOpCache {
  async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
    Ok(None)
  }

  async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
    Ok(())
  }

  async fn delete(&self, _key: &str) -> Result<(), CacheError> {
    Ok(())
  }

  async fn incr(&self, _key: &str) -> Result<u64, CacheError> {
    Ok(0)
  }

  async fn delete_matching(&self, _pattern: &str) -> Result<u64, CacheError> {
    Ok(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_noop_cache_never_hits() {
    let cache = NoOpCache;
    cache
      .set("invoice:invoices:getdetail:0001", "{}".to_string(), Duration::from_secs(5))
      .await
      .unwrap();

    assert_eq!(cache.get("invoice:invoices:getdetail:0001").await.unwrap(), None);
    assert_eq!(cache.delete_matching("invoice:*").await.unwrap(), 0);
  }
}
