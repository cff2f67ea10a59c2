//! Client setup

use redis::aio::{ConnectionLike, ConnectionManager};
use redis::Client;

use crate::config::RedisConfig;
use crate::error::Result;

/// Open a managed, auto-reconnecting connection to the configured server
pub async fn connect(config: &RedisConfig) -> Result<ConnectionManager> {
  tracing::info!(
    host = %config.host,
    port = config.port,
    db = config.database,
    tls = config.tls_enabled,
    "Connecting to Redis"
  );
  let client = Client::open(config.connection_url())?;
  let connection = ConnectionManager::new(client).await?;
  Ok(connection)
}

/// Round-trip a PING on the given connection
pub async fn ping<C: ConnectionLike>(conn: &mut C) -> Result<()> {
  let _: String = redis::cmd("PING").query_async(conn).await?;
  Ok(())
}
