//! Redis data-access objects
//!
//! - [`RedisBaseDao`]: sorted sets, hashes, strings and key management
//! - [`RedisService`]: lists, sets, compare-and-act Lua helpers and script execution

mod base;
mod expiry;
pub mod scripts;
mod service;

pub use base::{RedisBaseDao, ScoredMember};
pub use service::RedisService;
