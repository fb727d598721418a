//! Test doubles shared by the unit tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use uuid::Uuid;

use crate::transport::{SendOutcome, Transport};

#[derive(Debug, thiserror::Error)]
#[error("LRS unavailable")]
pub struct Unavailable;

#[derive(Clone, Copy, Default)]
enum Mode {
  #[default]
  Accept,
  Fail,
  Stall,
}

/// Records every batch it is given.
#[derive(Clone, Default)]
pub struct RecordingTransport {
  sent:     Arc<Mutex<Vec<(Option<String>, Value)>>>,
  puts:     Arc<Mutex<Vec<Uuid>>>,
  mode:     Mode,
  endpoint: Option<String>,
}

impl RecordingTransport {
  pub fn failing() -> Self {
    Self {
      mode: Mode::Fail,
      ..Self::default()
    }
  }

  pub fn stalled() -> Self {
    Self {
      mode: Mode::Stall,
      ..Self::default()
    }
  }

  pub fn sent(&self) -> Vec<Value> {
    self.sent.lock().unwrap().iter().map(|(_, v)| v.clone()).collect()
  }

  pub fn put_ids(&self) -> Vec<Uuid> { self.puts.lock().unwrap().clone() }

  async fn ready(&self) -> Result<(), Unavailable> {
    match self.mode {
      Mode::Fail => Err(Unavailable),
      Mode::Stall => std::future::pending().await,
      Mode::Accept => Ok(()),
    }
  }

  /// The endpoint each recorded statement was sent to.
  pub fn endpoints(&self) -> Vec<Option<String>> {
    self.sent.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
  }
}

impl Transport for RecordingTransport {
  type Error = Unavailable;

  async fn send(&self, batch: &[Value]) -> Result<SendOutcome, Unavailable> {
    self.ready().await?;
    self
      .sent
      .lock()
      .unwrap()
      .extend(batch.iter().map(|v| (self.endpoint.clone(), v.clone())));
    Ok(SendOutcome {
      statement_ids: batch.iter().map(|_| Uuid::new_v4()).collect(),
    })
  }

  async fn put(&self, id: Uuid, statement: &Value) -> Result<(), Unavailable> {
    self.ready().await?;
    self
      .sent
      .lock()
      .unwrap()
      .push((self.endpoint.clone(), statement.clone()));
    self.puts.lock().unwrap().push(id);
    Ok(())
  }

  /// Echoes the request back.
  async fn query(&self, resource: &str, query: Option<&str>) -> Result<Value, Unavailable> {
    self.ready().await?;
    Ok(serde_json::json!({ "resource": resource, "query": query }))
  }

  fn retarget(&self, endpoint: &str) -> Result<Self, Unavailable> {
    Ok(Self {
      endpoint: Some(endpoint.to_string()),
      ..self.clone()
    })
  }
}
