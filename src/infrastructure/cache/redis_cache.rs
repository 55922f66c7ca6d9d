use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

use super::{Cache, CacheError};

const SCAN_BATCH: usize = 100;

/// Redis-backed cache sharing the process-wide connection manager
#[derive(Clone)]
pub struct RedisCache {
  conn: ConnectionManager,
}

impl RedisCache {
  pub fn new(conn: ConnectionManager) -> Self {
    Self { conn }
  }
}

#[async_trait]
impl Cache for RedisCache {
  async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
    let mut conn = self.conn.clone();
    let value: Option<String> = conn.get(key).await?;
    Ok(value)
  }

  async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
    let mut conn = self.conn.clone();
    let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), CacheError> {
    let mut conn = self.conn.clone();
    let _: u64 = conn.del(key).await?;
    Ok(())
  }

  async fn incr(&self, key: &str) -> Result<u64, CacheError> {
    let mut conn = self.conn.clone();
    let next: u64 = conn.incr(key, 1u64).await?;
    Ok(next)
  }

  // SCAN instead of KEYS so large keyspaces don't block the server
  async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
    let mut conn = self.conn.clone();
    let mut cursor: u64 = 0;
    let mut removed: u64 = 0;

    loop {
      let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
        .arg(cursor)
        .arg("MATCH")
        .arg(pattern)
        .arg("COUNT")
        .arg(SCAN_BATCH)
        .query_async(&mut conn)
        .await?;

      if !keys.is_empty() {
        let deleted: u64 = conn.del(&keys).await?;
        removed += deleted;
      }

      if next == 0 {
        break;
      }
      cursor = next;
    }

    Ok(removed)
  }
}
