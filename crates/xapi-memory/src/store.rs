//! The collaborator traits over in-process maps.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::Deserialize;
use uuid::Uuid;
use xapi_core::{
  platform::{Content, Flagging, User},
  store::{ContentCatalog, FlagStore, UserDirectory},
};

use crate::{Error, Result};

type FlagKey = (String, String, Uuid);

/// Seed data, as found in a fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
  #[serde(default)]
  pub users:     Vec<User>,
  #[serde(default)]
  pub content:   Vec<Content>,
  #[serde(default)]
  pub flaggings: Vec<Flagging>,
}

impl Fixtures {
  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }
}

/// Users, content and flaggings held in memory. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  users:     Arc<RwLock<HashMap<Uuid, User>>>,
  content:   Arc<RwLock<BTreeMap<String, Content>>>,
  flaggings: Arc<RwLock<BTreeMap<FlagKey, Flagging>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
  lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
  lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn key(flag: &str, content_id: &str, user: Uuid) -> FlagKey {
  (flag.to_string(), content_id.to_string(), user)
}

impl MemoryStore {
  /// A store seeded from `fixtures`. Content items must have distinct
  /// canonical URLs.
  pub fn from_fixtures(fixtures: Fixtures) -> Result<Self> {
    let store = Self::default();
    for user in fixtures.users {
      store.insert_user(user);
    }
    for content in fixtures.content {
      if read(&store.content)
        .values()
        .any(|c| c.canonical_url == content.canonical_url)
      {
        return Err(Error::DuplicateActivityId(content.canonical_url));
      }
      store.insert_content(content);
    }
    {
      let mut flaggings = write(&store.flaggings);
      for flagging in fixtures.flaggings {
        flaggings.insert(
          key(&flagging.flag, &flagging.content_id, flagging.user),
          flagging,
        );
      }
    }
    Ok(store)
  }

  pub fn insert_user(&self, user: User) {
    write(&self.users).insert(user.uuid, user);
  }

  pub fn insert_content(&self, content: Content) {
    write(&self.content).insert(content.id.clone(), content);
  }

  pub fn flagging(&self, flag: &str, content_id: &str, user: Uuid) -> Option<Flagging> {
    read(&self.flaggings).get(&key(flag, content_id, user)).cloned()
  }

  pub fn flaggings(&self) -> Vec<Flagging> {
    read(&self.flaggings).values().cloned().collect()
  }
}

// ─── Trait implementations ───────────────────────────────────────────────────

impl UserDirectory for MemoryStore {
  type Error = Error;

  async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<User>> {
    Ok(read(&self.users).get(&uuid).cloned())
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(
      read(&self.users)
        .values()
        .find(|u| u.email().is_some_and(|e| e.eq_ignore_ascii_case(email)))
        .cloned(),
    )
  }

  async fn find_by_organization_identifier(
    &self,
    identifier: &str,
  ) -> Result<Option<User>> {
    Ok(
      read(&self.users)
        .values()
        .find(|u| u.organization_identifier() == Some(identifier))
        .cloned(),
    )
  }
}

impl ContentCatalog for MemoryStore {
  type Error = Error;

  async fn get(&self, content_id: &str) -> Result<Option<Content>> {
    Ok(read(&self.content).get(content_id).cloned())
  }

  async fn find_by_activity_id(&self, activity_id: &str) -> Result<Option<Content>> {
    let wanted = activity_id.trim_end_matches('/');
    Ok(
      read(&self.content)
        .values()
        .find(|c| c.canonical_url.trim_end_matches('/') == wanted)
        .cloned(),
    )
  }
}

impl FlagStore for MemoryStore {
  type Error = Error;

  async fn is_flagged(&self, flag: &str, content_id: &str, user: Uuid) -> Result<bool> {
    Ok(read(&self.flaggings).contains_key(&key(flag, content_id, user)))
  }

  async fn flag(&self, flagging: Flagging) -> Result<bool> {
    let mut flaggings = write(&self.flaggings);
    let slot = key(&flagging.flag, &flagging.content_id, flagging.user);
    if flaggings.contains_key(&slot) {
      return Ok(false);
    }
    flaggings.insert(slot, flagging);
    Ok(true)
  }

  async fn unflag(&self, flag: &str, content_id: &str, user: Uuid) -> Result<bool> {
    Ok(write(&self.flaggings).remove(&key(flag, content_id, user)).is_some())
  }
}
