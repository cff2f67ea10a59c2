//! Mapping `Duration` timeouts onto Redis expiry commands

use redis::aio::ConnectionLike;
use redis::{AsyncCommands, RedisResult};
use std::time::Duration;

/// A timeout at the resolution Redis will be asked to apply it.
///
/// Whole seconds go out as EX/EXPIRE, anything finer as PX/PEXPIRE rounded up
/// to the next millisecond. Values past `i64::MAX` saturate instead of
/// wrapping negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expiry {
  Seconds(i64),
  Millis(i64),
}

impl Expiry {
  pub(crate) fn from_duration(ttl: Duration) -> Self {
    if ttl.subsec_nanos() == 0 {
      Expiry::Seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
    } else {
      let millis = ttl.as_nanos().div_ceil(1_000_000);
      Expiry::Millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
  }

  /// Option name for `SET ... EX|PX n`
  pub(crate) fn set_option(&self) -> &'static str {
    match self {
      Expiry::Seconds(_) => "EX",
      Expiry::Millis(_) => "PX",
    }
  }

  pub(crate) fn amount(&self) -> i64 {
    match *self {
      Expiry::Seconds(n) | Expiry::Millis(n) => n,
    }
  }
}

/// EXPIRE or PEXPIRE `key`. Returns false if the key does not exist.
pub(crate) async fn expire<C>(conn: &mut C, key: &str, ttl: Duration) -> RedisResult<bool>
where
  C: ConnectionLike + Send,
{
  match Expiry::from_duration(ttl) {
    Expiry::Seconds(secs) => conn.expire(key, secs).await,
    Expiry::Millis(millis) => conn.pexpire(key, millis).await,
  }
}
