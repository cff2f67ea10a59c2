//! Thin data-access layer over the `redis` crate.
//!
//! [`RedisBaseDao`] covers sorted sets, hashes, strings and generic key
//! operations. [`RedisService`] adds lists, sets, Lua-backed compare-and-act
//! helpers and script execution.

pub mod config;
pub mod connection;
pub mod dao;
pub mod error;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{DaoConfig, LoggingSection, RedisConfig, ServiceSection};
pub use connection::{connect, ping};
pub use dao::{RedisBaseDao, RedisService, ScoredMember};
pub use error::{DaoError, Result};
