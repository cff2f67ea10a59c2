//! Sorted-set, hash, string and key operations

use redis::aio::{ConnectionLike, ConnectionManager};
use redis::{AsyncCommands, ToRedisArgs};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::error::Result;

/// One member of a sorted-set range, with its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMember {
  pub member: String,
  pub score: f64,
}

impl From<(String, f64)> for ScoredMember {
  fn from((member, score): (String, f64)) -> Self {
    Self { member, score }
  }
}

/// Data-access object over the sorted-set, hash and string command groups.
///
/// Every method clones the connection handle and issues a single command.
/// Client errors are returned to the caller unchanged.
#[derive(Clone)]
pub struct RedisBaseDao<C = ConnectionManager> {
  connection: C,
}

impl RedisBaseDao<ConnectionManager> {
  /// Connect using the given settings
  pub async fn connect(config: &RedisConfig) -> Result<Self> {
    Ok(Self::new(crate::connection::connect(config).await?))
  }
}

impl<C> RedisBaseDao<C>
where
  C: ConnectionLike + Clone + Send + Sync,
{
  pub fn new(connection: C) -> Self {
    Self { connection }
  }

  fn conn(&self) -> C {
    self.connection.clone()
  }

  // ---------------------------------------------------------------------
  // Sorted sets
  // ---------------------------------------------------------------------

  /// Add `member` with `score`. Returns true if the member is new.
  pub async fn add_zset_value(&self, key: &str, member: &str, score: f64) -> Result<bool> {
    let mut conn = self.conn();
    let added: i64 = conn.zadd(key, member, score).await?;
    Ok(added > 0)
  }

  /// Integer-score variant of [`Self::add_zset_value`]
  pub async fn add_zset_value_long(&self, key: &str, member: &str, score: i64) -> Result<bool> {
    let mut conn = self.conn();
    let added: i64 = conn.zadd(key, member, score).await?;
    Ok(added > 0)
  }

  /// Add several `(member, score)` pairs at once. Returns how many were new.
  pub async fn add_batch_zset_value(&self, key: &str, tuples: &[(&str, f64)]) -> Result<i64> {
    if tuples.is_empty() {
      return Ok(0);
    }
    // ZADD takes score before member
    let items: Vec<(f64, &str)> = tuples.iter().map(|(m, s)| (*s, *m)).collect();
    let mut conn = self.conn();
    let added: i64 = conn.zadd_multiple(key, items.as_slice()).await?;
    Ok(added)
  }

  pub async fn inc_zset_value(&self, key: &str, member: &str, delta: i64) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.zincr(key, member, delta).await?;
    Ok(())
  }

  /// Score of `member`, truncated toward zero. Missing members score 0.
  pub async fn get_zset_score(&self, key: &str, member: &str) -> Result<i64> {
    let score = self.get_zset_score_f64(key, member).await?;
    Ok(score as i64)
  }

  /// Score of `member`. Missing members score 0.0.
  pub async fn get_zset_score_f64(&self, key: &str, member: &str) -> Result<f64> {
    let mut conn = self.conn();
    let score: Option<f64> = conn.zscore(key, member).await?;
    Ok(score.unwrap_or(0.0))
  }

  /// Members in `[start, end]` ordered by ascending score
  pub async fn get_zset_rank(
    &self,
    key: &str,
    start: isize,
    end: isize,
  ) -> Result<Vec<ScoredMember>> {
    let mut conn = self.conn();
    let pairs: Vec<(String, f64)> = conn.zrange_withscores(key, start, end).await?;
    Ok(pairs.into_iter().map(ScoredMember::from).collect())
  }

  /// Members in `[start, end]` ordered by descending score
  pub async fn get_zset_rev_rank(
    &self,
    key: &str,
    start: isize,
    end: isize,
  ) -> Result<Vec<ScoredMember>> {
    let mut conn = self.conn();
    let pairs: Vec<(String, f64)> = conn.zrevrange_withscores(key, start, end).await?;
    Ok(pairs.into_iter().map(ScoredMember::from).collect())
  }

  pub async fn get_zset_count(&self, key: &str) -> Result<i64> {
    let mut conn = self.conn();
    Ok(conn.zcard(key).await?)
  }

  // ---------------------------------------------------------------------
  // Hashes
  // ---------------------------------------------------------------------

  pub async fn add_hash_value(&self, key: &str, field: &str, value: &str) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.hset(key, field, value).await?;
    Ok(())
  }

  pub async fn add_batch_hash_value(
    &self,
    key: &str,
    values: &HashMap<String, String>,
  ) -> Result<()> {
    if values.is_empty() {
      return Ok(());
    }
    let items: Vec<(&str, &str)> = values
      .iter()
      .map(|(f, v)| (f.as_str(), v.as_str()))
      .collect();
    let mut conn = self.conn();
    let _: () = conn.hset_multiple(key, items.as_slice()).await?;
    Ok(())
  }

  pub async fn inc_hash_value(&self, key: &str, field: &str, delta: i64) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.hincr(key, field, delta).await?;
    Ok(())
  }

  pub async fn delete_hash_value(&self, key: &str, field: &str) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.hdel(key, field).await?;
    Ok(())
  }

  pub async fn get_hash_value(&self, key: &str, field: &str) -> Result<Option<String>> {
    let mut conn = self.conn();
    Ok(conn.hget(key, field).await?)
  }

  /// All values of the hash, in server order
  pub async fn get_hash_all_value(&self, key: &str) -> Result<Vec<String>> {
    let mut conn = self.conn();
    Ok(conn.hvals(key).await?)
  }

  /// Values for `fields`, positionally; absent fields are `None`
  pub async fn get_hash_multi_value<F>(
    &self,
    key: &str,
    fields: &[F],
  ) -> Result<Vec<Option<String>>>
  where
    F: ToRedisArgs + Send + Sync,
  {
    if fields.is_empty() {
      return Ok(Vec::new());
    }
    let mut conn = self.conn();
    let values: Vec<Option<String>> = redis::cmd("HMGET")
      .arg(key)
      .arg(fields)
      .query_async(&mut conn)
      .await?;
    Ok(values)
  }

  pub async fn get_hash_count(&self, key: &str) -> Result<i64> {
    let mut conn = self.conn();
    Ok(conn.hlen(key).await?)
  }

  // ---------------------------------------------------------------------
  // Strings
  // ---------------------------------------------------------------------

  pub async fn add_value(&self, key: &str, value: &str) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.set(key, value).await?;
    Ok(())
  }

  pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
    let mut conn = self.conn();
    Ok(conn.get(key).await?)
  }

  // ---------------------------------------------------------------------
  // Keys
  // ---------------------------------------------------------------------

  pub async fn has_key(&self, key: &str) -> Result<bool> {
    let mut conn = self.conn();
    Ok(conn.exists(key).await?)
  }

  pub async fn has_hash_key(&self, key: &str, field: &str) -> Result<bool> {
    let mut conn = self.conn();
    Ok(conn.hexists(key, field).await?)
  }

  /// Set a timeout on `key`. Whole seconds use EXPIRE, anything finer PEXPIRE.
  /// Returns false if the key does not exist.
  pub async fn expire(&self, key: &str, timeout: Duration) -> Result<bool> {
    let mut conn = self.conn();
    Ok(super::expiry::expire(&mut conn, key, timeout).await?)
  }

  pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
    let mut conn = self.conn();
    Ok(conn.keys(pattern).await?)
  }

  /// Delete `keys`, returning how many existed
  pub async fn delete<K>(&self, keys: &[K]) -> Result<i64>
  where
    K: ToRedisArgs + Send + Sync,
  {
    if keys.is_empty() {
      return Ok(0);
    }
    let mut conn = self.conn();
    let removed: i64 = conn.del(keys).await?;
    tracing::debug!(requested = keys.len(), removed, "Deleted keys");
    Ok(removed)
  }
}
