//! Assembling statements from platform events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use xapi_core::{
  Activity, Actor, Ifi, Statement, Verb,
  platform::{Content, User},
};

use crate::{
  IdentityResolver, Site,
  activity::{ActivityProviders, system_activity},
};

/// Builds statement drafts: resolved actor, verb, activity, timestamp and the
/// platform context.
pub struct StatementBuilder {
  site:       Site,
  identity:   Arc<IdentityResolver>,
  activities: ActivityProviders,
}

impl StatementBuilder {
  pub fn new(site: Site, identity: Arc<IdentityResolver>) -> Self {
    Self {
      site,
      identity,
      activities: ActivityProviders::default(),
    }
  }

  pub fn with_activities(mut self, activities: ActivityProviders) -> Self {
    self.activities = activities;
    self
  }

  pub fn site(&self) -> &Site { &self.site }

  pub fn identity(&self) -> &IdentityResolver { &self.identity }

  /// A draft statement.
  ///
  /// Without a `user` the site itself is the actor (background jobs,
  /// anonymous sessions); without `content` the site is the object.
  pub fn build(
    &self,
    verb: impl Into<Verb>,
    content: Option<&Content>,
    timestamp: Option<DateTime<Utc>>,
    user: Option<&User>,
  ) -> Statement {
    let actor = match user {
      Some(user) => self.identity.actor_for(user),
      None => self.system_actor(),
    };
    let object = match content {
      Some(content) => self.activity_for(content),
      None => system_activity(&self.site),
    };

    let mut statement = Statement::new(actor, verb.into(), object);
    statement.timestamp = timestamp;
    statement.context_mut().platform = Some(self.site.platform());
    statement
  }

  pub fn activity_for(&self, content: &Content) -> Activity {
    self.activities.activity(content, &self.site)
  }

  /// The site acting on its own behalf.
  pub fn system_actor(&self) -> Actor {
    Actor::new(Ifi::account(self.site.name.clone(), self.site.base()))
      .with_name(self.site.name.clone())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use uuid::Uuid;
  use xapi_core::{LanguageMap, VerbKey};

  use super::*;
  use crate::identity::IdentityConfig;

  fn builder() -> StatementBuilder {
    let site = Site {
      name:     "Academy".into(),
      base_url: "https://lms.example".into(),
      version:  "7".into(),
    };
    let identity =
      IdentityResolver::from_config(&IdentityConfig::default(), &site).unwrap();
    StatementBuilder::new(site, Arc::new(identity))
  }

  fn course() -> Content {
    Content {
      id:            "42".into(),
      entity_type:   "node".into(),
      bundle:        Some("course".into()),
      canonical_url: "https://lms.example/node/42".into(),
      labels:        LanguageMap::from([("en".to_string(), "Algebra".to_string())]),
      descriptions:  LanguageMap::new(),
    }
  }

  #[test]
  fn user_statement_has_resolved_actor_and_platform() {
    let user = User::new(Uuid::new_v4());
    let statement =
      builder().build(VerbKey::Completed, Some(&course()), None, Some(&user));

    assert_eq!(
      statement.actor.ifi,
      Ifi::account(user.uuid.to_string(), "https://lms.example")
    );
    assert_eq!(statement.verb.id, VerbKey::Completed.uri());
    assert_eq!(statement.object.id, "https://lms.example/node/42");
    assert_eq!(
      statement.context.unwrap().platform.as_deref(),
      Some("Academy (7); https://lms.example")
    );
    assert_eq!(statement.version.as_deref(), Some("1.0.3"));
  }

  #[test]
  fn anonymous_statement_is_about_the_system() {
    let statement = builder().build(VerbKey::Launched, None, None, None);
    let value = statement.to_json().unwrap();
    assert_eq!(
      value["actor"],
      json!({
        "objectType": "Agent",
        "name": "Academy",
        "account": { "name": "Academy", "homePage": "https://lms.example" }
      })
    );
    assert_eq!(value["object"]["id"], json!("https://lms.example/"));
  }

  #[test]
  fn explicit_timestamp_is_kept() {
    let at = "2024-05-01T08:30:00Z".parse::<DateTime<Utc>>().unwrap();
    let statement = builder().build(VerbKey::Viewed, Some(&course()), Some(at), None);
    assert_eq!(statement.timestamp, Some(at));
  }
}
