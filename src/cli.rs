//! `rdao` command-line client

use clap::{Parser, Subcommand};
use redis::aio::ConnectionLike;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::DaoConfig;
use crate::dao::RedisService;

#[derive(Parser)]
#[command(name = "rdao", about = "Redis data-access client", version)]
pub struct CliArgs {
  #[arg(short, long)]
  pub config: Option<PathBuf>,
  #[arg(short = 'H', long)]
  pub host: Option<String>,
  #[arg(short, long)]
  pub port: Option<u16>,
  #[arg(long)]
  pub db: Option<u8>,
  #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
  pub password: Option<String>,
  #[arg(long)]
  pub log_level: Option<String>,
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
  /// Check the server is reachable
  Ping,
  /// Read a string value
  Get { key: String },
  /// Write a string value
  Set {
    key: String,
    value: String,
    /// Expiry in seconds, applied atomically with the write
    #[arg(long)]
    ttl: Option<u64>,
  },
  /// Delete keys that exist
  Del {
    #[arg(required = true)]
    keys: Vec<String>,
  },
  /// List keys matching a glob pattern
  Keys { pattern: String },
  /// List set members using SSCAN
  Members { key: String },
  /// Run a Lua script file
  Eval {
    file: PathBuf,
    /// KEYS entries, repeatable
    #[arg(short, long = "key")]
    keys: Vec<String>,
    /// ARGV entries
    args: Vec<String>,
  },
}

impl CliArgs {
  /// Config file to use: explicit path > auto-detect in the working directory
  pub fn config_source(&self) -> Option<PathBuf> {
    self
      .config
      .clone()
      .or_else(|| DaoConfig::locate_in(Path::new(".")))
  }

  /// Load config from `source` (defaults when absent), then apply CLI overrides
  pub fn load_config(&self, source: Option<&Path>) -> Result<DaoConfig, anyhow::Error> {
    let mut config = match source {
      Some(path) => DaoConfig::from_file(path)?,
      None => DaoConfig::default(),
    };
    self.apply_overrides(&mut config);
    Ok(config)
  }

  /// Load config: explicit path > auto-detect > defaults, then apply CLI overrides
  pub fn resolve_config(&self) -> Result<DaoConfig, anyhow::Error> {
    self.load_config(self.config_source().as_deref())
  }

  pub fn apply_overrides(&self, config: &mut DaoConfig) {
    if let Some(host) = &self.host {
      config.redis.host = host.clone();
    }
    if let Some(port) = self.port {
      config.redis.port = port;
    }
    if let Some(db) = self.db {
      config.redis.database = db;
    }
    if let Some(password) = &self.password {
      config.redis.password = Some(password.clone());
    }
    if let Some(level) = &self.log_level {
      config.logging.level = level.clone();
    }
  }
}

/// Execute one subcommand against `service`, returning the JSON to print
pub async fn run_command<C>(
  service: &RedisService<C>,
  command: &Commands,
) -> Result<serde_json::Value, anyhow::Error>
where
  C: ConnectionLike + Clone + Send + Sync,
{
  let output = match command {
    Commands::Ping => {
      service.ping().await?;
      serde_json::json!("PONG")
    }
    Commands::Get { key } => serde_json::json!(service.get(key).await?),
    Commands::Set { key, value, ttl } => {
      let ok = match ttl {
        Some(secs) => {
          service
            .set_with_atomic(key, value, Duration::from_secs(*secs))
            .await
        }
        None => service.set(key, value).await,
      };
      if !ok {
        anyhow::bail!("failed to set {}", key);
      }
      serde_json::json!("OK")
    }
    Commands::Del { keys } => {
      service.remove_many(keys.as_slice()).await?;
      serde_json::json!("OK")
    }
    Commands::Keys { pattern } => {
      let mut keys = service.keys(pattern).await?;
      keys.sort();
      serde_json::json!(keys)
    }
    Commands::Members { key } => serde_json::json!(service.set_scan(key).await?),
    Commands::Eval { file, keys, args } => {
      let reply: redis::Value = service
        .exec_lua_script(file, keys.as_slice(), args.as_slice())
        .await?;
      value_to_json(reply)
    }
  };
  Ok(output)
}

/// Render a raw reply for display
pub fn value_to_json(value: redis::Value) -> serde_json::Value {
  use redis::Value;
  match value {
    Value::Nil => serde_json::Value::Null,
    Value::Int(i) => serde_json::json!(i),
    Value::Okay => serde_json::json!("OK"),
    Value::SimpleString(s) => serde_json::json!(s),
    Value::BulkString(bytes) => match String::from_utf8(bytes) {
      Ok(s) => serde_json::json!(s),
      Err(e) => serde_json::json!(e.into_bytes()),
    },
    Value::Array(items) | Value::Set(items) => {
      serde_json::Value::Array(items.into_iter().map(value_to_json).collect())
    }
    Value::Double(d) => serde_json::json!(d),
    Value::Boolean(b) => serde_json::json!(b),
    other => serde_json::json!(format!("{:?}", other)),
  }
}
