//! The seam between the pipeline and a Learning Record Store.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// What the LRS reported for a delivered batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
  /// Ids assigned by the LRS, one per statement, in order.
  pub statement_ids: Vec<Uuid>,
}

/// Delivers serialized statements to an LRS.
///
/// Statements travel as JSON values so that relayed statements which do not
/// validate locally can still be forwarded untouched.
pub trait Transport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    batch: &'a [Value],
  ) -> impl Future<Output = Result<SendOutcome, Self::Error>> + Send + 'a;

  /// Store one statement under `id` (`PUT statements?statementId=`).
  fn put<'a>(
    &'a self,
    id: Uuid,
    statement: &'a Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Read an LRS resource (`statements`, `agents`, `about`…) with the
  /// caller's query string, returning the LRS's JSON answer.
  fn query<'a>(
    &'a self,
    resource: &'a str,
    query: Option<&'a str>,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  /// The same transport pointed at another endpoint. Credentials only
  /// follow the transport to an endpoint on the same origin.
  fn retarget(&self, endpoint: &str) -> Result<Self, Self::Error>
  where
    Self: Sized;
}
