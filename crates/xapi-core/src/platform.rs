//! Host-application types a statement is built from: users, content, and
//! flaggings.
//!
//! These are read-model snapshots handed to the pipeline by the host's
//! collaborator implementations (see [`crate::store`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LanguageMap;

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A platform account. Every user has a UUID; all other attributes are
/// optional and treated as absent when blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub uuid:                    Uuid,
  #[serde(default)]
  pub display_name:            Option<String>,
  #[serde(default)]
  pub email:                   Option<String>,
  /// Identifier issued by the user's organization SSO provider.
  #[serde(default)]
  pub organization_identifier: Option<String>,
  #[serde(default)]
  pub organization_homepage:   Option<String>,
}

impl User {
  pub fn new(uuid: Uuid) -> Self {
    Self {
      uuid,
      display_name: None,
      email: None,
      organization_identifier: None,
      organization_homepage: None,
    }
  }

  pub fn display_name(&self) -> Option<&str> { non_empty(&self.display_name) }

  pub fn email(&self) -> Option<&str> { non_empty(&self.email) }

  pub fn organization_identifier(&self) -> Option<&str> {
    non_empty(&self.organization_identifier)
  }

  pub fn organization_homepage(&self) -> Option<&str> {
    non_empty(&self.organization_homepage)
  }
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// An application entity a statement can be about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
  pub id:            String,
  /// Entity type, e.g. `node`, `comment`, `file`, `taxonomy_term`, `user`.
  pub entity_type:   String,
  /// Content type within the entity type, e.g. `course` or `event`.
  #[serde(default)]
  pub bundle:        Option<String>,
  pub canonical_url: String,
  /// Entity label per language.
  #[serde(default)]
  pub labels:        LanguageMap,
  #[serde(default)]
  pub descriptions:  LanguageMap,
}

impl Content {
  /// The content type used for content-scoped states: the bundle, or the
  /// entity type for entities without bundles.
  pub fn content_type(&self) -> &str {
    self.bundle.as_deref().unwrap_or(&self.entity_type)
  }
}

// ─── Flagging ────────────────────────────────────────────────────────────────

/// A user's flag on a piece of content, e.g. "completed" or "bookmark".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flagging {
  pub flag:       String,
  pub content_id: String,
  pub user:       Uuid,
  pub created:    DateTime<Utc>,
}
