//! Statement types: the unit of record sent to the Learning Record Store.
//!
//! Field names follow the xAPI 1.0.3 JSON binding. Optional members are
//! omitted from the serialized form when empty so that statements built here
//! are byte-for-byte what an LRS expects to receive.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, serde_helpers::one_or_many};

/// The xAPI version stamped on locally built statements.
pub const XAPI_VERSION: &str = "1.0.3";

/// Language tag → human-readable string.
pub type LanguageMap = BTreeMap<String, String>;

fn agent_object_type() -> String { "Agent".to_string() }

fn activity_object_type() -> String { "Activity".to_string() }

// ─── Actor ───────────────────────────────────────────────────────────────────

/// An account on some system, identified by `name` within `homePage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub name:      String,
  #[serde(rename = "homePage")]
  pub home_page: String,
}

/// Inverse Functional Identifier: exactly one way of naming an actor.
///
/// Serialized flattened into the actor object, so an `Ifi::Mbox` becomes
/// `"mbox": "mailto:…"` and an `Ifi::Account` becomes `"account": {…}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIfi", into = "RawIfi")]
pub enum Ifi {
  Mbox(String),
  Account(Account),
}

impl Ifi {
  /// An mbox IFI for `email`, adding the `mailto:` scheme when absent.
  pub fn mbox_for(email: &str) -> Self {
    if email.starts_with("mailto:") {
      Self::Mbox(email.to_string())
    } else {
      Self::Mbox(format!("mailto:{email}"))
    }
  }

  pub fn account(name: impl Into<String>, home_page: impl Into<String>) -> Self {
    Self::Account(Account {
      name:      name.into(),
      home_page: home_page.into(),
    })
  }

  /// The email address behind an mbox IFI, without the scheme.
  pub fn email(&self) -> Option<&str> {
    match self {
      Self::Mbox(mbox) => Some(mbox.strip_prefix("mailto:").unwrap_or(mbox)),
      Self::Account(_) => None,
    }
  }

  pub fn as_account(&self) -> Option<&Account> {
    match self {
      Self::Account(account) => Some(account),
      Self::Mbox(_) => None,
    }
  }
}

/// Wire shape of an IFI; validated into [`Ifi`].
#[derive(Serialize, Deserialize)]
struct RawIfi {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  mbox:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  account: Option<Account>,
}

impl TryFrom<RawIfi> for Ifi {
  type Error = Error;

  fn try_from(raw: RawIfi) -> Result<Self, Self::Error> {
    match (raw.mbox, raw.account) {
      (Some(_), Some(_)) => Err(Error::AmbiguousIfi),
      (None, None) => Err(Error::MissingIfi),
      (Some(mbox), None) if mbox.trim().is_empty() => Err(Error::EmptyMbox),
      (Some(mbox), None) => Ok(Self::Mbox(mbox)),
      (None, Some(account)) if account.name.trim().is_empty() => {
        Err(Error::EmptyAccountName)
      }
      (None, Some(account)) => Ok(Self::Account(account)),
    }
  }
}

impl From<Ifi> for RawIfi {
  fn from(ifi: Ifi) -> Self {
    match ifi {
      Ifi::Mbox(mbox) => Self {
        mbox:    Some(mbox),
        account: None,
      },
      Ifi::Account(account) => Self {
        mbox:    None,
        account: Some(account),
      },
    }
  }
}

/// The agent who performed the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  #[serde(rename = "objectType", default = "agent_object_type")]
  pub object_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:        Option<String>,
  #[serde(flatten)]
  pub ifi:         Ifi,
}

impl Actor {
  pub fn new(ifi: Ifi) -> Self {
    Self {
      object_type: agent_object_type(),
      name: None,
      ifi,
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }
}

// ─── Verb ────────────────────────────────────────────────────────────────────

/// What the actor did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verb {
  pub id:      String,
  #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
  pub display: LanguageMap,
}

impl Verb {
  /// A verb with an English display string.
  pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
    Self {
      id:      id.into(),
      display: LanguageMap::from([("en".to_string(), display.into())]),
    }
  }
}

// ─── Activity ────────────────────────────────────────────────────────────────

/// Descriptive metadata for an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDefinition {
  /// Activity type IRI.
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind:        Option<String>,
  #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
  pub name:        LanguageMap,
  #[serde(default, skip_serializing_if = "LanguageMap::is_empty")]
  pub description: LanguageMap,
  #[serde(rename = "moreInfo", default, skip_serializing_if = "Option::is_none")]
  pub more_info:   Option<String>,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub extensions:  Map<String, Value>,
}

impl ActivityDefinition {
  pub fn is_empty(&self) -> bool {
    self.kind.is_none()
      && self.name.is_empty()
      && self.description.is_empty()
      && self.more_info.is_none()
      && self.extensions.is_empty()
  }
}

/// The thing the actor acted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  #[serde(rename = "objectType", default = "activity_object_type")]
  pub object_type: String,
  /// Activity IRI.
  pub id:          String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub definition:  Option<ActivityDefinition>,
}

impl Activity {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      object_type: activity_object_type(),
      id:          id.into(),
      definition:  None,
    }
  }

  /// Attach `definition`, dropping it when it carries nothing.
  pub fn with_definition(mut self, definition: ActivityDefinition) -> Self {
    self.definition = (!definition.is_empty()).then_some(definition);
    self
  }

  /// The activity type IRI, if defined.
  pub fn kind(&self) -> Option<&str> {
    self.definition.as_ref().and_then(|d| d.kind.as_deref())
  }
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// Related activities, grouped by relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextActivities {
  #[serde(default, with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
  pub parent:   Vec<Activity>,
  #[serde(default, with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
  pub grouping: Vec<Activity>,
  #[serde(default, with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
  pub category: Vec<Activity>,
  #[serde(default, with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
  pub other:    Vec<Activity>,
}

impl ContextActivities {
  pub fn is_empty(&self) -> bool {
    self.parent.is_empty()
      && self.grouping.is_empty()
      && self.category.is_empty()
      && self.other.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub registration:       Option<Uuid>,
  #[serde(
    rename = "contextActivities",
    default,
    skip_serializing_if = "ContextActivities::is_empty"
  )]
  pub context_activities: ContextActivities,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platform:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language:           Option<String>,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub extensions:         Map<String, Value>,
}

impl Context {
  pub fn is_empty(&self) -> bool {
    self.registration.is_none()
      && self.context_activities.is_empty()
      && self.platform.is_none()
      && self.language.is_none()
      && self.extensions.is_empty()
  }
}

// ─── Result ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scaled: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub raw:    Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min:    Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max:    Option<f64>,
}

impl Score {
  /// A raw score out of `max`. The scaled/min/max members are only filled
  /// in when `raw / max` is a valid scaled score (within `[-1, 1]`).
  pub fn new(raw: f64, max: f64, min: f64) -> Self {
    let mut score = Self {
      raw: Some(raw),
      ..Self::default()
    };
    let scaled = raw / max;
    if (-1.0..=1.0).contains(&scaled) {
      score.scaled = Some(scaled);
      score.min = Some(min);
      score.max = Some(max);
    }
    score
  }
}

/// Outcome of the action (named `result` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub score:      Option<Score>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub success:    Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completion: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response:   Option<String>,
  /// ISO-8601 duration, e.g. `PT12.5S`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration:   Option<String>,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub extensions: Map<String, Value>,
}

impl StatementResult {
  /// Set the learner's response. Whitespace is trimmed; an empty response
  /// is not recorded.
  pub fn set_response(&mut self, response: &str) {
    let response = response.trim();
    if !response.is_empty() {
      self.response = Some(response.to_string());
    }
  }

  pub fn set_duration(&mut self, duration: Duration) {
    self.duration = Some(iso8601_seconds(duration));
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

/// Render `duration` as an ISO-8601 duration in seconds (`PT{s}S`).
pub fn iso8601_seconds(duration: Duration) -> String {
  format!("PT{}S", duration.as_secs_f64())
}

// ─── Statement ───────────────────────────────────────────────────────────────

/// One xAPI statement: actor, verb, object, and optional context, result and
/// timestamp.
///
/// Members this model does not name (`stored`, `authority`, `attachments`…)
/// are kept in `other` so relayed statements round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:        Option<Uuid>,
  pub actor:     Actor,
  pub verb:      Verb,
  pub object:    Activity,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub context:   Option<Context>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result:    Option<StatementResult>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version:   Option<String>,
  #[serde(flatten)]
  pub other:     Map<String, Value>,
}

impl Statement {
  /// A bare statement with the local xAPI version stamped on it.
  pub fn new(actor: Actor, verb: Verb, object: Activity) -> Self {
    Self {
      id: None,
      actor,
      verb,
      object,
      context: None,
      result: None,
      timestamp: None,
      version: Some(XAPI_VERSION.to_string()),
      other: Map::new(),
    }
  }

  /// Mutable access to the context, creating it if absent.
  pub fn context_mut(&mut self) -> &mut Context {
    self.context.get_or_insert_with(Context::default)
  }

  /// Mutable access to the result, creating it if absent.
  pub fn result_mut(&mut self) -> &mut StatementResult {
    self.result.get_or_insert_with(StatementResult::default)
  }

  /// Add `activity` as a parent context activity.
  pub fn with_parent(mut self, activity: Activity) -> Self {
    self.context_mut().context_activities.parent.push(activity);
    self
  }

  /// Record the time spent between `started` and `now` as the result
  /// duration. A `started` in the future records a zero duration.
  pub fn with_duration_since(
    mut self,
    started: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> Self {
    let elapsed = (now - started).to_std().unwrap_or_default();
    self.result_mut().set_duration(elapsed);
    self
  }

  pub fn to_json(&self) -> crate::Result<Value> { Ok(serde_json::to_value(self)?) }

  pub fn from_json(value: Value) -> crate::Result<Self> {
    Ok(serde_json::from_value(value)?)
  }
}
