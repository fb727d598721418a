//! Learner states: flag changes ⇄ xAPI statements.
//!
//! A state ties a local flag ("completed", "bookmark"…) to the verbs that
//! express it. Flagging content emits the add verb, unflagging emits the
//! remove verb (if the state has one). Statements arriving from clients with
//! those verbs are mirrored back into the flag store.

use std::{
  collections::{HashMap, HashSet},
  sync::{Arc, Mutex, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xapi_core::{
  Statement, VerbKey,
  platform::{Content, Flagging, User},
  store::FlagStore,
};

use crate::{Error, Result, StatementBuilder};

// ─── Definitions ─────────────────────────────────────────────────────────────

fn yes() -> bool { true }

/// A learner state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
  pub id:             String,
  #[serde(default)]
  pub label:          Option<String>,
  pub add_verb:       VerbKey,
  /// `None` for one-way states; unflagging then emits nothing.
  #[serde(default)]
  pub remove_verb:    Option<VerbKey>,
  /// Whether statements received from clients update the local flag.
  #[serde(default = "yes")]
  pub notify_on_xapi: bool,
  /// The local flag this state mirrors, if any.
  #[serde(default)]
  pub flag:           Option<String>,
  /// Content types this state applies to; empty means all.
  #[serde(default)]
  pub content_types:  Vec<String>,
}

/// What a verb means for a state's flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOperation {
  Add,
  Remove,
  None,
}

impl StateDefinition {
  pub fn new(id: impl Into<String>, add_verb: VerbKey) -> Self {
    Self {
      id: id.into(),
      label: None,
      add_verb,
      remove_verb: None,
      notify_on_xapi: true,
      flag: None,
      content_types: Vec::new(),
    }
  }

  pub fn applies_to(&self, content: &Content) -> bool {
    self.content_types.is_empty()
      || self
        .content_types
        .iter()
        .any(|t| t == content.content_type())
  }

  pub fn operation(&self, verb_uri: &str) -> FlagOperation {
    if self.add_verb.uri() == verb_uri {
      FlagOperation::Add
    } else if self.remove_verb.is_some_and(|v| v.uri() == verb_uri) {
      FlagOperation::Remove
    } else {
      FlagOperation::None
    }
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The active state definitions. Readers take a snapshot; [`reload`]
/// replaces the whole set at once.
///
/// [`reload`]: StateRegistry::reload
#[derive(Debug)]
pub struct StateRegistry {
  states: RwLock<Arc<[StateDefinition]>>,
}

impl StateRegistry {
  pub fn new(states: Vec<StateDefinition>) -> Result<Self> {
    validate(&states)?;
    Ok(Self {
      states: RwLock::new(states.into()),
    })
  }

  pub fn snapshot(&self) -> Arc<[StateDefinition]> {
    self
      .states
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn reload(&self, states: Vec<StateDefinition>) -> Result<()> {
    validate(&states)?;
    *self.states.write().unwrap_or_else(PoisonError::into_inner) = states.into();
    tracing::info!("state registry reloaded");
    Ok(())
  }

  pub fn get(&self, id: &str) -> Option<StateDefinition> {
    self.snapshot().iter().find(|s| s.id == id).cloned()
  }

  /// The operation of the first state (in declaration order) that `verb_uri`
  /// means something to.
  pub fn operation_for(&self, verb_uri: &str) -> FlagOperation {
    self
      .snapshot()
      .iter()
      .map(|s| s.operation(verb_uri))
      .find(|op| *op != FlagOperation::None)
      .unwrap_or(FlagOperation::None)
  }
}

fn validate(states: &[StateDefinition]) -> Result<()> {
  let mut seen = HashSet::new();
  for state in states {
    if !seen.insert(state.id.as_str()) {
      return Err(Error::DuplicateState(state.id.clone()));
    }
  }
  Ok(())
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagChange {
  Flagged,
  Unflagged,
}

/// A local flag change raised by the host.
#[derive(Debug, Clone)]
pub struct FlagEvent {
  pub flag:      String,
  pub content:   Content,
  pub user:      User,
  pub operation: FlagChange,
  pub at:        DateTime<Utc>,
}

/// Flags changed while mirroring a received statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorOutcome {
  pub flagged:   Vec<String>,
  pub unflagged: Vec<String>,
}

type MirrorKey = (String, String, uuid::Uuid);

/// Removes its key from the in-progress set when dropped.
struct MirrorGuard<'a> {
  active: &'a Mutex<HashSet<MirrorKey>>,
  key:    MirrorKey,
}

impl Drop for MirrorGuard<'_> {
  fn drop(&mut self) {
    self
      .active
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.key);
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct StateEngine<F> {
  registry: Arc<StateRegistry>,
  builder:  Arc<StatementBuilder>,
  flags:    Arc<F>,
  /// Flaggings currently being written on behalf of a received statement.
  active:   Mutex<HashSet<MirrorKey>>,
  /// Changes made by a finished mirror that the host may still report.
  echoes:   Mutex<HashMap<MirrorKey, FlagChange>>,
}

impl<F: FlagStore> StateEngine<F> {
  pub fn new(
    registry: Arc<StateRegistry>,
    builder: Arc<StatementBuilder>,
    flags: Arc<F>,
  ) -> Self {
    Self {
      registry,
      builder,
      flags,
      active: Mutex::new(HashSet::new()),
      echoes: Mutex::new(HashMap::new()),
    }
  }

  pub fn registry(&self) -> &StateRegistry { &self.registry }

  /// Statement drafts for a local flag change.
  ///
  /// Changes made by mirroring a received statement produce nothing, both
  /// while the mirror is writing and when the host reports the change
  /// afterwards. Each mirrored change is absorbed once; a later opposite
  /// change is sent as usual.
  pub fn on_flag_event(&self, event: &FlagEvent) -> Vec<Statement> {
    if self.is_mirroring(&event.flag, &event.content.id, &event.user)
      || self.take_echo(event)
    {
      tracing::debug!(flag = %event.flag, "flag change caused by a received statement; not re-sent");
      return Vec::new();
    }

    self
      .registry
      .snapshot()
      .iter()
      .filter(|s| s.flag.as_deref() == Some(event.flag.as_str()))
      .filter(|s| s.applies_to(&event.content))
      .filter_map(|s| match event.operation {
        FlagChange::Flagged => Some(s.add_verb),
        FlagChange::Unflagged => s.remove_verb,
      })
      .map(|verb| {
        self.builder.build(
          verb,
          Some(&event.content),
          Some(event.at),
          Some(&event.user),
        )
      })
      .collect()
  }

  /// Write a local flag change to the flag store, then draft its statements.
  /// A change that leaves the flag as it was drafts nothing.
  pub async fn apply(&self, event: &FlagEvent) -> Result<Vec<Statement>> {
    let changed = match event.operation {
      FlagChange::Flagged => {
        self
          .flags
          .flag(Flagging {
            flag:       event.flag.clone(),
            content_id: event.content.id.clone(),
            user:       event.user.uuid,
            created:    event.at,
          })
          .await
      }
      FlagChange::Unflagged => {
        self
          .flags
          .unflag(&event.flag, &event.content.id, event.user.uuid)
          .await
      }
    }
    .map_err(|e| Error::Store(Box::new(e)))?;

    if !changed {
      tracing::debug!(flag = %event.flag, content = %event.content.id, "flag already in place; nothing to send");
      return Ok(Vec::new());
    }
    Ok(self.on_flag_event(event))
  }

  /// Mirror a statement received from a client into the local flags of
  /// `user` on `content`.
  pub async fn on_statement_received(
    &self,
    statement: &Statement,
    user: &User,
    content: &Content,
  ) -> Result<MirrorOutcome> {
    let mut outcome = MirrorOutcome::default();
    let states = self.registry.snapshot();

    for state in states.iter().filter(|s| s.notify_on_xapi) {
      let Some(flag) = state.flag.as_deref() else { continue };
      if !state.applies_to(content) {
        continue;
      }
      let operation = state.operation(&statement.verb.id);
      if operation == FlagOperation::None {
        continue;
      }

      let _guard = self.begin_mirror(flag, &content.id, user);
      let flagged = self
        .flags
        .is_flagged(flag, &content.id, user.uuid)
        .await
        .map_err(|e| Error::Store(Box::new(e)))?;

      match operation {
        FlagOperation::Add if !flagged => {
          let flagging = Flagging {
            flag:       flag.to_string(),
            content_id: content.id.clone(),
            user:       user.uuid,
            created:    statement.timestamp.unwrap_or_else(Utc::now),
          };
          if self
            .flags
            .flag(flagging)
            .await
            .map_err(|e| Error::Store(Box::new(e)))?
          {
            self.expect_echo(flag, &content.id, user, FlagChange::Flagged);
            outcome.flagged.push(flag.to_string());
          }
        }
        FlagOperation::Remove if flagged => {
          if self
            .flags
            .unflag(flag, &content.id, user.uuid)
            .await
            .map_err(|e| Error::Store(Box::new(e)))?
          {
            self.expect_echo(flag, &content.id, user, FlagChange::Unflagged);
            outcome.unflagged.push(flag.to_string());
          }
        }
        _ => {}
      }
    }

    Ok(outcome)
  }

  /// A statement for `state_id` built directly, without a flag change (quiz
  /// answered, test attempted…).
  pub fn fire(
    &self,
    state_id: &str,
    content: Option<&Content>,
    user: Option<&User>,
    at: Option<DateTime<Utc>>,
  ) -> Result<Statement> {
    let state = self
      .registry
      .get(state_id)
      .ok_or_else(|| Error::UnknownState(state_id.to_string()))?;
    if let Some(content) = content
      && !state.applies_to(content)
    {
      return Err(Error::UnsupportedContent {
        state:        state.id,
        content_type: content.content_type().to_string(),
      });
    }
    Ok(self.builder.build(state.add_verb, content, at, user))
  }

  fn begin_mirror(&self, flag: &str, content_id: &str, user: &User) -> MirrorGuard<'_> {
    let key = (flag.to_string(), content_id.to_string(), user.uuid);
    self
      .active
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.clone());
    MirrorGuard {
      active: &self.active,
      key,
    }
  }

  fn expect_echo(&self, flag: &str, content_id: &str, user: &User, change: FlagChange) {
    self
      .echoes
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert((flag.to_string(), content_id.to_string(), user.uuid), change);
  }

  /// Consume the echo recorded for the event's key. True when it matches the
  /// event; a stale echo of the opposite change is dropped.
  fn take_echo(&self, event: &FlagEvent) -> bool {
    let key = (event.flag.clone(), event.content.id.clone(), event.user.uuid);
    self
      .echoes
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&key)
      .is_some_and(|change| change == event.operation)
  }

  fn is_mirroring(&self, flag: &str, content_id: &str, user: &User) -> bool {
    self
      .active
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains(&(flag.to_string(), content_id.to_string(), user.uuid))
  }
}
