//! Statements received from clients on their way to the LRS.
//!
//! Each statement in the batch is checked. Valid statements about known
//! users get the site's actor and update local flags; everything else is
//! relayed exactly as received.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use xapi_core::{
  Statement,
  store::{ContentCatalog, FlagStore, UserDirectory},
};

use crate::{Error, Pipeline, Result, SendOutcome, identity::Identity, transport::Transport};

/// Parse `raw` as a statement with an identifiable actor, a verb id and an
/// object id.
pub fn valid_statement(raw: &Value) -> Result<Statement, String> {
  let statement = Statement::deserialize(raw).map_err(|e| e.to_string())?;
  if statement.verb.id.trim().is_empty() {
    return Err("missing verb id".into());
  }
  if statement.object.id.trim().is_empty() {
    return Err("missing object id".into());
  }
  Ok(statement)
}

/// Split a request body into statements: a single object or an array.
pub fn split_batch(payload: Value) -> Result<Vec<Value>> {
  match payload {
    Value::Array(items) => Ok(items),
    item @ Value::Object(_) => Ok(vec![item]),
    _ => Err(Error::InvalidPayload(
      "expected a statement object or an array of statements".into(),
    )),
  }
}

impl<D, C, F, T> Pipeline<D, C, F, T>
where
  D: UserDirectory + 'static,
  C: ContentCatalog,
  F: FlagStore,
  T: Transport,
{
  /// Process and relay an inbound request body.
  pub async fn receive(&self, payload: Value) -> Result<SendOutcome> {
    let batch = split_batch(payload)?;
    let mut relayed = Vec::with_capacity(batch.len());
    for raw in batch {
      relayed.push(self.receive_one(raw).await);
    }
    Ok(self.dispatcher().forward(relayed).await?)
  }

  /// Process and relay a statement stored under a client-chosen id. The id
  /// in the body, if any, must be `statement_id`.
  pub async fn receive_put(&self, statement_id: Uuid, payload: Value) -> Result<()> {
    if !payload.is_object() {
      return Err(Error::InvalidPayload("expected a statement object".into()));
    }
    if let Some(id) = payload.get("id") {
      let matches = id
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .is_some_and(|id| id == statement_id);
      if !matches {
        return Err(Error::InvalidPayload(format!(
          "statementId ({statement_id}) must match the id of the statement ({id})"
        )));
      }
    }
    let relayed = self.receive_one(payload).await;
    Ok(self.dispatcher().forward_put(statement_id, relayed).await?)
  }

  async fn receive_one(&self, raw: Value) -> Value {
    let mut statement = match valid_statement(&raw) {
      Ok(statement) => statement,
      Err(reason) => {
        tracing::warn!("relaying invalid statement unchanged: {reason}");
        return raw;
      }
    };

    let user = match self.identity().identify(&statement.actor, self.directory()).await {
      Identity::Known(user) => user,
      Identity::NotFound => {
        tracing::info!(actor = ?statement.actor.ifi, "statement actor is not a known user");
        return raw;
      }
    };
    statement.actor = self.identity().actor_for(&user);

    match self.catalog().find_by_activity_id(&statement.object.id).await {
      Ok(Some(content)) => {
        match self.states().on_statement_received(&statement, &user, &content).await {
          Ok(outcome) if !outcome.flagged.is_empty() || !outcome.unflagged.is_empty() => {
            tracing::info!(
              user = %user.uuid,
              content = %content.id,
              flagged = ?outcome.flagged,
              unflagged = ?outcome.unflagged,
              "mirrored received statement"
            );
          }
          Ok(_) => {}
          Err(e) => tracing::error!(content = %content.id, "failed to mirror statement: {e}"),
        }
      }
      Ok(None) => tracing::debug!(object = %statement.object.id, "no local content for activity"),
      Err(e) => tracing::error!(object = %statement.object.id, "content lookup failed: {e}"),
    }

    match serde_json::to_value(&statement) {
      Ok(value) => value,
      Err(e) => {
        tracing::warn!("relaying statement unchanged, re-serialization failed: {e}");
        raw
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::json;
  use xapi_core::{VerbKey, platform::User};
  use xapi_memory::MemoryStore;

  use super::*;
  use crate::{
    pipeline::tests::{course, pipeline},
    test_support::RecordingTransport,
  };

  fn completed_by(actor: Value) -> Value {
    json!({
      "actor": actor,
      "verb": { "id": VerbKey::Completed.uri() },
      "object": { "id": "https://lms.example/node/42" },
      "timestamp": "2024-04-01T12:00:00Z",
      "authority": { "mbox": "mailto:lrs@example.com" }
    })
  }

  #[test]
  fn batches_are_objects_or_arrays() {
    assert_eq!(split_batch(json!({ "a": 1 })).unwrap().len(), 1);
    assert_eq!(split_batch(json!([{}, {}])).unwrap().len(), 2);
    assert!(matches!(split_batch(json!("x")), Err(Error::InvalidPayload(_))));
  }

  #[test]
  fn statements_need_actor_verb_and_object() {
    let actor = json!({ "mbox": "mailto:a@example.com" });
    assert!(valid_statement(&completed_by(actor.clone())).is_ok());
    assert!(valid_statement(&completed_by(json!({ "name": "anon" }))).is_err());

    let mut no_verb = completed_by(actor);
    no_verb["verb"]["id"] = json!("");
    assert!(valid_statement(&no_verb).is_err());
  }

  #[tokio::test]
  async fn known_user_statement_is_normalized_and_mirrored() {
    let store = Arc::new(MemoryStore::default());
    let mut user = User::new(Uuid::new_v4());
    user.email = Some("ada@example.com".into());
    store.insert_user(user.clone());
    store.insert_content(course());
    let transport = RecordingTransport::default();
    let pipeline = pipeline(store.clone(), transport.clone());

    let raw = completed_by(json!({
      "account": { "name": user.uuid.to_string(), "homePage": "https://lms.example" }
    }));
    let outcome = pipeline.receive(raw).await.unwrap();
    assert_eq!(outcome.statement_ids.len(), 1);

    let sent = transport.sent();
    assert_eq!(sent[0]["actor"]["mbox"], "mailto:ada@example.com");
    assert!(sent[0]["actor"].get("account").is_none());
    assert_eq!(sent[0]["authority"]["mbox"], "mailto:lrs@example.com");

    let flagging = store.flagging("completed", "42", user.uuid).unwrap();
    assert_eq!(flagging.created.to_rfc3339(), "2024-04-01T12:00:00+00:00");
  }

  #[tokio::test]
  async fn put_requires_a_matching_id() {
    let store = Arc::new(MemoryStore::default());
    let mut user = User::new(Uuid::new_v4());
    user.email = Some("ada@example.com".into());
    store.insert_user(user.clone());
    store.insert_content(course());
    let transport = RecordingTransport::default();
    let pipeline = pipeline(store.clone(), transport.clone());
    let id = Uuid::new_v4();

    let mut raw = completed_by(json!({ "mbox": "mailto:ada@example.com" }));
    raw["id"] = json!(Uuid::new_v4().to_string());
    assert!(matches!(
      pipeline.receive_put(id, raw.clone()).await,
      Err(Error::InvalidPayload(_))
    ));
    assert!(matches!(
      pipeline.receive_put(id, json!([raw.clone()])).await,
      Err(Error::InvalidPayload(_))
    ));
    assert!(transport.sent().is_empty());

    raw["id"] = json!(id.to_string());
    pipeline.receive_put(id, raw).await.unwrap();
    assert_eq!(transport.put_ids(), vec![id]);
    assert!(store.flagging("completed", "42", user.uuid).is_some());
  }

  #[tokio::test]
  async fn invalid_and_unknown_statements_are_relayed_untouched() {
    let store = Arc::new(MemoryStore::default());
    store.insert_content(course());
    let transport = RecordingTransport::default();
    let pipeline = pipeline(store.clone(), transport.clone());

    let ambiguous = completed_by(json!({
      "mbox": "mailto:a@example.com",
      "account": { "name": "a", "homePage": "https://sso.example" }
    }));
    let stranger = completed_by(json!({ "mbox": "mailto:ghost@example.com" }));
    let batch = json!([ambiguous.clone(), stranger.clone()]);

    pipeline.receive(batch).await.unwrap();
    assert_eq!(transport.sent(), vec![ambiguous, stranger]);
    assert!(store.flaggings().is_empty());
  }
}
