//! Recording stand-in for a Redis connection.
//!
//! Every command is captured as its argument list; replies are served from a
//! queue in the order they were pushed. Clones share state, matching how the
//! DAOs clone their connection handle per call.

#![allow(dead_code)]

use parking_lot::Mutex;
use redis::aio::ConnectionLike;
use redis::{Arg, Cmd, ErrorKind, Pipeline, RedisError, RedisFuture, RedisResult, Value};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct MockState {
  commands: Vec<Vec<String>>,
  replies: VecDeque<RedisResult<Value>>,
}

#[derive(Clone, Default)]
pub struct MockConnection {
  state: Arc<Mutex<MockState>>,
}

impl MockConnection {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue a reply
  pub fn reply(self, value: Value) -> Self {
    self.state.lock().replies.push_back(Ok(value));
    self
  }

  /// Queue an I/O failure
  pub fn fail(self, message: &'static str) -> Self {
    self
      .state
      .lock()
      .replies
      .push_back(Err(RedisError::from((ErrorKind::IoError, message))));
    self
  }

  /// Every command issued so far
  pub fn commands(&self) -> Vec<Vec<String>> {
    self.state.lock().commands.clone()
  }

  /// Just the command names, in order
  pub fn command_names(&self) -> Vec<String> {
    self
      .state
      .lock()
      .commands
      .iter()
      .map(|c| c[0].clone())
      .collect()
  }

  pub fn pending_replies(&self) -> usize {
    self.state.lock().replies.len()
  }
}

fn render(cmd: &Cmd) -> Vec<String> {
  cmd
    .args_iter()
    .map(|arg| match arg {
      Arg::Simple(bytes) => String::from_utf8_lossy(bytes).into_owned(),
      Arg::Cursor => "<cursor>".to_string(),
    })
    .collect()
}

impl ConnectionLike for MockConnection {
  fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
    let reply = {
      let mut state = self.state.lock();
      state.commands.push(render(cmd));
      state
        .replies
        .pop_front()
        .unwrap_or_else(|| Err(RedisError::from((ErrorKind::ClientError, "no reply queued"))))
    };
    Box::pin(async move { reply })
  }

  fn req_packed_commands<'a>(
    &'a mut self,
    _cmd: &'a Pipeline,
    _offset: usize,
    _count: usize,
  ) -> RedisFuture<'a, Vec<Value>> {
    Box::pin(async {
      Err(RedisError::from((
        ErrorKind::ClientError,
        "pipelines are not recorded",
      )))
    })
  }

  fn get_db(&self) -> i64 {
    0
  }
}

pub fn bulk(s: &str) -> Value {
  Value::BulkString(s.as_bytes().to_vec())
}

pub fn array(items: &[&str]) -> Value {
  Value::Array(items.iter().map(|s| bulk(s)).collect())
}

pub fn args(parts: &[&str]) -> Vec<String> {
  parts.iter().map(|s| s.to_string()).collect()
}
