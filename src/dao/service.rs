//! Key/value service with list, set and Lua helpers

use redis::aio::{ConnectionLike, ConnectionManager};
use redis::{AsyncCommands, FromRedisValue, Script, ToRedisArgs, Value};
use std::path::Path;
use std::time::Duration;

use super::expiry::{self, Expiry};
use super::scripts::{COMPARE_AND_DEL, COMPARE_AND_REFRESH, COMPARE_AND_UPDATE};
use crate::config::{RedisConfig, ServiceSection};
use crate::error::{DaoError, Result};

fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

/// A zero expiry would delete the key (or be refused) instead of writing it
fn reject_zero_ttl(key: &str, ttl: Duration) -> bool {
  if ttl.is_zero() {
    tracing::error!(key, "Refusing to write with a zero expiry");
    return true;
  }
  false
}

/// Build an invocation of `script` with the given KEYS and ARGV and run it
async fn invoke<C, T, K, A>(conn: &mut C, script: &Script, keys: &[K], args: &[A]) -> Result<T>
where
  C: ConnectionLike,
  T: FromRedisValue,
  K: ToRedisArgs,
  A: ToRedisArgs,
{
  let mut invocation = script.prepare_invoke();
  for key in keys {
    invocation.key(key);
  }
  for arg in args {
    invocation.arg(arg);
  }
  Ok(invocation.invoke_async(conn).await?)
}

/// Higher-level key/value service.
///
/// Boolean writes (`set`, `set_with_expire`, `set_with_atomic`, `update_setex`,
/// `del_value`) log failures and report `false` instead of returning an error.
pub struct RedisService<C = ConnectionManager> {
  connection: C,
  default_ttl: Duration,
  scan_count: usize,
  compare_and_del: Script,
  compare_and_update: Script,
  compare_and_refresh: Script,
}

impl RedisService<ConnectionManager> {
  /// Connect using the given settings
  pub async fn connect(config: &RedisConfig, service: &ServiceSection) -> Result<Self> {
    let connection = crate::connection::connect(config).await?;
    Ok(Self::from_config(connection, service))
  }
}

impl<C> RedisService<C>
where
  C: ConnectionLike + Clone + Send + Sync,
{
  pub fn new(connection: C) -> Self {
    Self::from_config(connection, &ServiceSection::default())
  }

  pub fn from_config(connection: C, service: &ServiceSection) -> Self {
    Self {
      connection,
      default_ttl: service.default_ttl(),
      scan_count: service.scan_count.max(1),
      compare_and_del: Script::new(COMPARE_AND_DEL),
      compare_and_update: Script::new(COMPARE_AND_UPDATE),
      compare_and_refresh: Script::new(COMPARE_AND_REFRESH),
    }
  }

  /// Expiry used by `del_setex` and `update_setex`
  pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
    self.default_ttl = ttl;
    self
  }

  /// COUNT hint for each SSCAN page
  pub fn with_scan_count(mut self, count: usize) -> Self {
    self.scan_count = count.max(1);
    self
  }

  pub fn default_ttl(&self) -> Duration {
    self.default_ttl
  }

  fn conn(&self) -> C {
    self.connection.clone()
  }

  // ---------------------------------------------------------------------
  // Strings
  // ---------------------------------------------------------------------

  /// SET `key`. Returns false (after logging) on failure.
  pub async fn set(&self, key: &str, value: &str) -> bool {
    let mut conn = self.conn();
    let result: redis::RedisResult<()> = conn.set(key, value).await;
    match result {
      Ok(()) => true,
      Err(e) => {
        tracing::error!(key, error = %e, "SET failed");
        false
      }
    }
  }

  /// SET followed by a separate EXPIRE (PEXPIRE for sub-second `ttl`).
  /// Returns false (after logging) on failure or a zero `ttl`.
  pub async fn set_with_expire(&self, key: &str, value: &str, ttl: Duration) -> bool {
    if reject_zero_ttl(key, ttl) {
      return false;
    }
    let mut conn = self.conn();
    let result: redis::RedisResult<()> = async {
      let _: () = conn.set(key, value).await?;
      expiry::expire(&mut conn, key, ttl).await?;
      Ok(())
    }
    .await;
    match result {
      Ok(()) => true,
      Err(e) => {
        tracing::error!(key, error = %e, "SET with expiry failed");
        false
      }
    }
  }

  /// SETEX (PSETEX for sub-second `ttl`) in a single command.
  /// Returns false (after logging) on failure or a zero `ttl`.
  pub async fn set_with_atomic(&self, key: &str, value: &str, ttl: Duration) -> bool {
    if reject_zero_ttl(key, ttl) {
      return false;
    }
    let mut conn = self.conn();
    let result: redis::RedisResult<()> = match Expiry::from_duration(ttl) {
      Expiry::Seconds(secs) => conn.set_ex(key, value, secs as u64).await,
      Expiry::Millis(millis) => conn.pset_ex(key, value, millis as u64).await,
    };
    match result {
      Ok(()) => true,
      Err(e) => {
        tracing::error!(key, error = %e, "SETEX failed");
        false
      }
    }
  }

  pub async fn ping(&self) -> Result<()> {
    let mut conn = self.conn();
    crate::connection::ping(&mut conn).await
  }

  pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
    let mut conn = self.conn();
    Ok(conn.keys(pattern).await?)
  }

  pub async fn get(&self, key: &str) -> Result<Option<String>> {
    let mut conn = self.conn();
    Ok(conn.get(key).await?)
  }

  pub async fn exists(&self, key: &str) -> Result<bool> {
    let mut conn = self.conn();
    Ok(conn.exists(key).await?)
  }

  /// Delete `key` if it exists
  pub async fn remove(&self, key: &str) -> Result<()> {
    if self.exists(key).await? {
      let mut conn = self.conn();
      let _: () = conn.del(key).await?;
    }
    Ok(())
  }

  /// [`Self::remove`] each key in order, stopping at the first error
  pub async fn remove_many<K: AsRef<str>>(&self, keys: &[K]) -> Result<()> {
    for key in keys {
      self.remove(key.as_ref()).await?;
    }
    Ok(())
  }

  /// Delete every key matching `pattern`
  pub async fn remove_pattern(&self, pattern: &str) -> Result<()> {
    let mut conn = self.conn();
    let keys: Vec<String> = conn.keys(pattern).await?;
    if !keys.is_empty() {
      let _: () = conn.del(keys.as_slice()).await?;
      tracing::debug!(pattern, count = keys.len(), "Removed keys by pattern");
    }
    Ok(())
  }

  // ---------------------------------------------------------------------
  // Hashes
  // ---------------------------------------------------------------------

  pub async fn hm_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.hset(key, field, value).await?;
    Ok(())
  }

  pub async fn hm_get(&self, key: &str, field: &str) -> Result<Option<String>> {
    let mut conn = self.conn();
    Ok(conn.hget(key, field).await?)
  }

  // ---------------------------------------------------------------------
  // Lists
  // ---------------------------------------------------------------------

  /// Append `value` to the tail of the list (RPUSH)
  pub async fn l_push(&self, key: &str, value: &str) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.rpush(key, value).await?;
    Ok(())
  }

  pub async fn l_range(&self, key: &str, start: isize, end: isize) -> Result<Vec<String>> {
    let mut conn = self.conn();
    Ok(conn.lrange(key, start, end).await?)
  }

  // ---------------------------------------------------------------------
  // Sets
  // ---------------------------------------------------------------------

  pub async fn add<M>(&self, key: &str, members: &[M]) -> Result<()>
  where
    M: ToRedisArgs + Send + Sync,
  {
    if members.is_empty() {
      return Ok(());
    }
    let mut conn = self.conn();
    let _: () = conn.sadd(key, members).await?;
    Ok(())
  }

  pub async fn set_members(&self, key: &str) -> Result<Vec<String>> {
    let mut conn = self.conn();
    Ok(conn.smembers(key).await?)
  }

  /// One SSCAN page starting at `cursor`. A returned cursor of 0 ends the scan.
  pub async fn set_scan_page(&self, key: &str, cursor: u64) -> Result<(u64, Vec<String>)> {
    let mut conn = self.conn();
    let page: (u64, Vec<String>) = redis::cmd("SSCAN")
      .arg(key)
      .arg(cursor)
      .arg("COUNT")
      .arg(self.scan_count)
      .query_async(&mut conn)
      .await?;
    Ok(page)
  }

  /// All members of the set, fetched incrementally with SSCAN.
  /// A member may appear twice if the set is modified during the scan.
  pub async fn set_scan(&self, key: &str) -> Result<Vec<String>> {
    let mut members = Vec::new();
    let mut cursor = 0;
    loop {
      let (next, page) = self.set_scan_page(key, cursor).await?;
      members.extend(page);
      if next == 0 {
        break;
      }
      cursor = next;
    }
    Ok(members)
  }

  // ---------------------------------------------------------------------
  // Sorted sets
  // ---------------------------------------------------------------------

  pub async fn z_add(&self, key: &str, member: &str, score: f64) -> Result<()> {
    let mut conn = self.conn();
    let _: () = conn.zadd(key, member, score).await?;
    Ok(())
  }

  pub async fn range_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<String>> {
    let mut conn = self.conn();
    Ok(conn.zrangebyscore(key, min, max).await?)
  }

  // ---------------------------------------------------------------------
  // Session-style helpers
  // ---------------------------------------------------------------------

  /// Replace `key` with `value` under the default expiry. Failures are logged only.
  pub async fn del_setex(&self, key: &str, value: &str) {
    if let Err(e) = self.remove(key).await {
      tracing::error!(key, error = %e, "Failed to clear key before rewrite");
      return;
    }
    if !self.set_with_expire(key, value, self.default_ttl).await {
      tracing::warn!(key, "Rewrite with default expiry did not complete");
    }
  }

  /// Refresh the expiry of `key` if it currently holds `value`.
  ///
  /// Returns false when the key is missing, blank, holds something else, or
  /// the call fails.
  pub async fn update_setex(&self, key: &str, value: &str) -> bool {
    if reject_zero_ttl(key, self.default_ttl) {
      return false;
    }
    let result: Result<bool> = async {
      match self.get(key).await? {
        Some(current) if !is_blank(&current) && current == value => {
          let mut conn = self.conn();
          let ttl = Expiry::from_duration(self.default_ttl);
          let amount = ttl.amount().to_string();
          let refreshed: i64 = invoke(
            &mut conn,
            &self.compare_and_refresh,
            &[key],
            &[value, ttl.set_option(), amount.as_str()],
          )
          .await?;
          Ok(refreshed == 1)
        }
        _ => Ok(false),
      }
    }
    .await;

    result.unwrap_or_else(|e| {
      tracing::error!(key, error = %e, "Failed to refresh key");
      false
    })
  }

  /// Delete `key` if it currently holds `value`.
  ///
  /// A missing or blank key counts as already deleted and returns true. A
  /// different value returns false.
  pub async fn del_value(&self, key: &str, value: &str) -> bool {
    let result: Result<bool> = async {
      match self.get(key).await? {
        Some(current) if !is_blank(&current) => {
          if current != value {
            return Ok(false);
          }
          if self.compare_and_delete(key, value).await? {
            return Ok(true);
          }
          // Lost a race: only a key that vanished meanwhile counts as deleted
          Ok(!self.exists(key).await?)
        }
        _ => Ok(true),
      }
    }
    .await;

    result.unwrap_or_else(|e| {
      tracing::error!(key, error = %e, "Failed to delete key by value");
      false
    })
  }

  // ---------------------------------------------------------------------
  // Lua
  // ---------------------------------------------------------------------

  /// Atomically delete `key` if it holds `expected`. Returns true if deleted.
  pub async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
    let mut conn = self.conn();
    let removed: i64 = invoke(&mut conn, &self.compare_and_del, &[key], &[expected]).await?;
    Ok(removed > 0)
  }

  /// Atomically replace the value of `key` with `new` if it holds `expected`
  pub async fn compare_and_update(&self, key: &str, expected: &str, new: &str) -> Result<bool> {
    let mut conn = self.conn();
    let reply: Value =
      invoke(&mut conn, &self.compare_and_update, &[key], &[expected, new]).await?;
    match reply {
      Value::Okay => Ok(true),
      Value::SimpleString(s) if s == "OK" => Ok(true),
      Value::Int(0) => Ok(false),
      other => Err(DaoError::UnexpectedReply(format!(
        "compare-and-update returned {:?}",
        other
      ))),
    }
  }

  /// Run the Lua script stored at `path` with the given KEYS and ARGV
  pub async fn exec_lua_script<T, K, A>(
    &self,
    path: impl AsRef<Path>,
    keys: &[K],
    args: &[A],
  ) -> Result<T>
  where
    T: FromRedisValue,
    K: ToRedisArgs,
    A: ToRedisArgs,
  {
    let path = path.as_ref();
    let source = tokio::fs::read_to_string(path)
      .await
      .map_err(|source| DaoError::Script {
        path: path.to_path_buf(),
        source,
      })?;
    self.exec_lua_literal(&source, keys, args).await
  }

  /// Run literal Lua `source` with the given KEYS and ARGV
  pub async fn exec_lua_literal<T, K, A>(&self, source: &str, keys: &[K], args: &[A]) -> Result<T>
  where
    T: FromRedisValue,
    K: ToRedisArgs,
    A: ToRedisArgs,
  {
    tracing::debug!(script = source, "Executing Lua script");
    let script = Script::new(source);
    let mut conn = self.conn();
    invoke(&mut conn, &script, keys, args).await
  }
}
