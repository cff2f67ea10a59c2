use std::path::PathBuf;

/// Errors raised by the data-access layer
#[derive(Debug, thiserror::Error)]
pub enum DaoError {
  #[error("redis: {0}")]
  Redis(#[from] redis::RedisError),

  #[error("failed to read Lua script {path}: {source}")]
  Script {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unexpected reply: {0}")]
  UnexpectedReply(String),
}

pub type Result<T> = std::result::Result<T, DaoError>;
