//! Mapping platform content to xAPI activities.
//!
//! The statement envelope is assembled once in [`crate::builder`]; the only
//! thing that varies per kind of content is the activity, produced by the
//! first [`ActivityProvider`] that supports it.

use std::sync::Arc;

use xapi_core::{
  Activity, ActivityDefinition, LanguageMap,
  platform::Content,
};

use crate::Site;

/// Activity type IRIs.
pub mod activity_type {
  pub const APPLICATION: &str = "http://activitystrea.ms/schema/1.0/application";
  pub const ARTICLE: &str = "http://activitystrea.ms/schema/1.0/article";
  pub const TIP: &str = "http://id.tincanapi.com/activitytype/resource";
  pub const FLASHCARD: &str =
    "https://w3id.org/xapi/flashcards/activity-types/flashcard";
  pub const PODCAST_EPISODE: &str =
    "https://w3id.org/xapi/audio/activity-type/audio";
  pub const ASSESSMENT: &str = "http://adlnet.gov/expapi/activities/assessment";
  pub const QUESTION: &str = "http://adlnet.gov/expapi/activities/question";
  pub const COURSE: &str = "http://adlnet.gov/expapi/activities/course";
  pub const DOCUMENT: &str = "http://id.tincanapi.com/activitytype/document";
  pub const EVENT: &str = "http://activitystrea.ms/schema/1.0/event";
  pub const TOPIC: &str = "http://id.tincanapi.com/activitytype/category";
  pub const TAG: &str = "http://id.tincanapi.com/activitytype/tag";
  pub const GROUP: &str = "http://activitystrea.ms/schema/1.0/group";
  pub const PROFILE: &str = "http://id.tincanapi.com/activitytype/user-profile";
  pub const COMMENT: &str = "http://activitystrea.ms/schema/1.0/comment";
  pub const GOAL: &str = "http://id.tincanapi.com/activitytype/goal";
  pub const BADGE: &str = "http://activitystrea.ms/schema/1.0/badge";
  pub const CERTIFICATE: &str =
    "https://www.opigno.org/en/tincan_registry/activity_type/certificate";
}

/// Activity type for an entity type and bundle.
pub fn activity_type_for(entity_type: &str, bundle: Option<&str>) -> Option<&'static str> {
  use activity_type::*;

  let by_bundle = match (entity_type, bundle.unwrap_or(entity_type)) {
    ("node", "learn_article" | "learn_link" | "learn_package" | "learn_file") => {
      Some(ARTICLE)
    }
    ("node", "course") => Some(COURSE),
    ("node", "tip_card") => Some(TIP),
    ("node", "flash_card") => Some(FLASHCARD),
    ("node", "quiz") => Some(QUESTION),
    ("node", "test") => Some(ASSESSMENT),
    ("node", "podcast") => return None,
    ("node", "podcast_episode") => Some(PODCAST_EPISODE),
    ("node", "event") => Some(EVENT),
    ("taxonomy_term", "category") => Some(TOPIC),
    ("taxonomy_term", "tags") => Some(TAG),
    ("group", "audience") => Some(GROUP),
    ("task", "user_task") => Some(GOAL),
    _ => None,
  };

  by_bundle.or(match entity_type {
    "comment" => Some(COMMENT),
    "file" => Some(DOCUMENT),
    "node" => Some(ARTICLE),
    "taxonomy_term" => Some(TOPIC),
    "user" => Some(PROFILE),
    _ => None,
  })
}

/// Produces the activity for content it supports.
pub trait ActivityProvider: Send + Sync {
  fn supports(&self, content: &Content) -> bool;

  fn activity(&self, content: &Content, site: &Site) -> Activity;
}

/// The default: the canonical URL as id, type from entity type and bundle,
/// name from the entity's translated labels.
pub struct CanonicalActivityProvider;

impl ActivityProvider for CanonicalActivityProvider {
  fn supports(&self, _content: &Content) -> bool { true }

  fn activity(&self, content: &Content, _site: &Site) -> Activity {
    Activity::new(&content.canonical_url).with_definition(ActivityDefinition {
      kind: activity_type_for(&content.entity_type, content.bundle.as_deref())
        .map(str::to_string),
      name: content.labels.clone(),
      ..ActivityDefinition::default()
    })
  }
}

/// Badges and certificates, which have no page of their own.
pub struct AchievementActivityProvider;

impl ActivityProvider for AchievementActivityProvider {
  fn supports(&self, content: &Content) -> bool {
    content.entity_type == "achievement"
  }

  fn activity(&self, content: &Content, site: &Site) -> Activity {
    let kind = match content.bundle.as_deref() {
      Some("certificate") => activity_type::CERTIFICATE,
      _ => activity_type::BADGE,
    };
    Activity::new(format!("{}/achievements/{}", site.base(), content.id))
      .with_definition(ActivityDefinition {
        kind: Some(kind.to_string()),
        name: content.labels.clone(),
        description: content.descriptions.clone(),
        ..ActivityDefinition::default()
      })
  }
}

/// Quiz questions, described by their question text.
pub struct QuestionActivityProvider;

impl ActivityProvider for QuestionActivityProvider {
  fn supports(&self, content: &Content) -> bool {
    content.entity_type == "node" && content.bundle.as_deref() == Some("quiz")
  }

  fn activity(&self, content: &Content, _site: &Site) -> Activity {
    Activity::new(&content.canonical_url).with_definition(ActivityDefinition {
      kind: Some(activity_type::QUESTION.to_string()),
      name: content.labels.clone(),
      description: content.descriptions.clone(),
      ..ActivityDefinition::default()
    })
  }
}

/// Ordered providers, falling back to [`CanonicalActivityProvider`].
#[derive(Clone)]
pub struct ActivityProviders {
  providers: Vec<Arc<dyn ActivityProvider>>,
}

impl Default for ActivityProviders {
  fn default() -> Self {
    Self {
      providers: vec![
        Arc::new(AchievementActivityProvider),
        Arc::new(QuestionActivityProvider),
      ],
    }
  }
}

impl ActivityProviders {
  pub fn empty() -> Self { Self { providers: Vec::new() } }

  /// Consult `provider` before the ones already registered.
  pub fn prepend(mut self, provider: Arc<dyn ActivityProvider>) -> Self {
    self.providers.insert(0, provider);
    self
  }

  pub fn activity(&self, content: &Content, site: &Site) -> Activity {
    match self.providers.iter().find(|p| p.supports(content)) {
      Some(provider) => provider.activity(content, site),
      None => CanonicalActivityProvider.activity(content, site),
    }
  }
}

/// The activity representing the site itself.
pub fn system_activity(site: &Site) -> Activity {
  Activity::new(format!("{}/", site.base())).with_definition(ActivityDefinition {
    kind: Some(activity_type::APPLICATION.to_string()),
    name: LanguageMap::from([("en".to_string(), site.name.clone())]),
    ..ActivityDefinition::default()
  })
}
