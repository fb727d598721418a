//! Sending statements: ordered enrichment hooks around a [`Transport`].
//!
//! ```text
//! draft ─▶ pre hooks (priority desc) ─▶ timestamp ─▶ send (bounded) ─▶ post hooks ─▶ Dispatched
//! ```
//!
//! A pre hook veto, a transport error or a timeout affects only the statement
//! being dispatched. The dispatcher holds no per-dispatch state, so one
//! instance can be shared between tasks.

use std::{cmp::Reverse, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;
use xapi_core::Statement;

use crate::{
  DispatchError, HookError,
  transport::{SendOutcome, Transport},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Hooks ───────────────────────────────────────────────────────────────────

/// Runs before a statement is sent and may modify or veto it.
#[async_trait]
pub trait PreDispatch: Send + Sync {
  fn name(&self) -> &str;

  /// Higher runs first.
  fn priority(&self) -> i32 { 0 }

  async fn before_send(&self, statement: &mut Statement) -> Result<(), HookError>;
}

/// Runs after a statement was accepted by the LRS. Failures are logged.
#[async_trait]
pub trait PostDispatch: Send + Sync {
  fn name(&self) -> &str;

  /// Higher runs first.
  fn priority(&self) -> i32 { 0 }

  async fn after_send(
    &self,
    statement: &Statement,
    outcome: &SendOutcome,
  ) -> Result<(), HookError>;
}

#[derive(Clone, Default)]
struct Hooks {
  pre:  Vec<Arc<dyn PreDispatch>>,
  post: Vec<Arc<dyn PostDispatch>>,
}

// ─── Dispatched ──────────────────────────────────────────────────────────────

/// A statement the LRS accepted. Read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
  statement: Statement,
  outcome:   SendOutcome,
}

impl Dispatched {
  pub fn statement(&self) -> &Statement { &self.statement }

  pub fn outcome(&self) -> &SendOutcome { &self.outcome }

  pub fn into_statement(self) -> Statement { self.statement }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

pub struct Dispatcher<T> {
  transport: T,
  hooks:     Arc<Hooks>,
  timeout:   Duration,
}

impl<T: Transport> Dispatcher<T> {
  pub fn new(transport: T) -> Self {
    Self {
      transport,
      hooks: Arc::default(),
      timeout: DEFAULT_TIMEOUT,
    }
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn pre_hook(mut self, hook: Arc<dyn PreDispatch>) -> Self {
    let hooks = Arc::make_mut(&mut self.hooks);
    hooks.pre.push(hook);
    hooks.pre.sort_by_key(|h| Reverse(h.priority()));
    self
  }

  pub fn post_hook(mut self, hook: Arc<dyn PostDispatch>) -> Self {
    let hooks = Arc::make_mut(&mut self.hooks);
    hooks.post.push(hook);
    hooks.post.sort_by_key(|h| Reverse(h.priority()));
    self
  }

  pub fn transport(&self) -> &T { &self.transport }

  /// The same hooks and timeout in front of another transport.
  pub fn with_transport<U: Transport>(&self, transport: U) -> Dispatcher<U> {
    Dispatcher {
      transport,
      hooks: self.hooks.clone(),
      timeout: self.timeout,
    }
  }

  /// Enrich, send and post-process one statement.
  pub async fn dispatch(
    &self,
    mut draft: Statement,
  ) -> Result<Dispatched, DispatchError> {
    for hook in &self.hooks.pre {
      hook.before_send(&mut draft).await.map_err(|e| {
        tracing::warn!(hook = hook.name(), verb = %draft.verb.id, "statement rejected: {e}");
        DispatchError::Rejected {
          hook:   hook.name().to_string(),
          reason: e.to_string(),
        }
      })?;
    }

    if draft.timestamp.is_none() {
      draft.timestamp = Some(Utc::now());
    }

    let outcome = self.send(vec![serde_json::to_value(&draft)?]).await?;
    if draft.id.is_none() {
      draft.id = outcome.statement_ids.first().copied();
    }
    tracing::info!(verb = %draft.verb.id, object = %draft.object.id, "statement sent");

    for hook in &self.hooks.post {
      if let Err(e) = hook.after_send(&draft, &outcome).await {
        tracing::warn!(hook = hook.name(), "post-dispatch hook failed: {e}");
      }
    }

    Ok(Dispatched {
      statement: draft,
      outcome,
    })
  }

  /// Dispatch in order, one at a time. One result per draft.
  pub async fn dispatch_all(
    &self,
    drafts: Vec<Statement>,
  ) -> Vec<Result<Dispatched, DispatchError>> {
    let mut results = Vec::with_capacity(drafts.len());
    for draft in drafts {
      results.push(self.dispatch(draft).await);
    }
    results
  }

  /// Relay already-serialized statements untouched: no hooks run.
  pub async fn forward(
    &self,
    batch: Vec<Value>,
  ) -> Result<SendOutcome, DispatchError> {
    self.send(batch).await
  }

  /// Relay one statement to be stored under `id`. No hooks run.
  pub async fn forward_put(&self, id: Uuid, statement: Value) -> Result<(), DispatchError> {
    self.bounded(self.transport.put(id, &statement)).await
  }

  /// Pass a read request through to the LRS.
  pub async fn query(
    &self,
    resource: &str,
    query: Option<&str>,
  ) -> Result<Value, DispatchError> {
    self.bounded(self.transport.query(resource, query)).await
  }

  async fn send(&self, batch: Vec<Value>) -> Result<SendOutcome, DispatchError> {
    self.bounded(self.transport.send(&batch)).await
  }

  async fn bounded<O>(
    &self,
    request: impl Future<Output = Result<O, T::Error>>,
  ) -> Result<O, DispatchError> {
    match tokio::time::timeout(self.timeout, request).await {
      Ok(Ok(out)) => Ok(out),
      Ok(Err(e)) => Err(DispatchError::Transport(Box::new(e))),
      Err(_) => {
        tracing::warn!(timeout = ?self.timeout, "LRS request timed out");
        Err(DispatchError::Timeout(self.timeout))
      }
    }
  }
}
