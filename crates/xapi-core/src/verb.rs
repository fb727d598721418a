//! The verb catalogue.
//!
//! Verbs are looked up by [`VerbKey`]; configuration files name verbs by their
//! snake_case key (`completed`, `bookmarked`, …) and inbound statements are
//! matched back to a key by URI.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::statement::Verb;

/// Every verb the platform emits or reacts to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerbKey {
  Viewed,
  Completed,
  Attended,
  Asked,
  Responded,
  Earned,
  Annotated,
  Answered,
  Attempted,
  Passed,
  Failed,
  Commented,
  Voided,
  Launched,
  Experienced,
  Interacted,
  Defined,
  Cancelled,
  Received,
  Bookmarked,
  Unbookmarked,
}

impl VerbKey {
  /// The verb IRI.
  pub fn uri(self) -> &'static str {
    match self {
      Self::Viewed => "http://id.tincanapi.com/verb/viewed",
      Self::Completed => "http://adlnet.gov/expapi/verbs/completed",
      Self::Attended => "http://adlnet.gov/expapi/verbs/attended",
      Self::Asked => "http://adlnet.gov/expapi/verbs/asked",
      Self::Responded => "http://adlnet.gov/expapi/verbs/responded",
      Self::Earned => "http://id.tincanapi.com/verb/earned",
      Self::Annotated => "http://risc-inc.com/annotator/verbs/annotated",
      Self::Answered => "http://adlnet.gov/expapi/verbs/answered",
      Self::Attempted => "http://adlnet.gov/expapi/verbs/attempted",
      Self::Passed => "http://adlnet.gov/expapi/verbs/passed",
      Self::Failed => "http://adlnet.gov/expapi/verbs/failed",
      Self::Commented => "http://adlnet.gov/expapi/verbs/commented",
      Self::Voided => "http://adlnet.gov/expapi/verbs/voided",
      Self::Launched => "http://adlnet.gov/expapi/verbs/launched",
      Self::Experienced => "http://adlnet.gov/expapi/verbs/experienced",
      Self::Interacted => "http://adlnet.gov/expapi/verbs/interacted",
      Self::Defined => "http://id.tincanapi.com/verb/defined",
      Self::Cancelled => "http://activitystrea.ms/schema/1.0/cancel",
      Self::Received => "http://activitystrea.ms/schema/1.0/receive",
      Self::Bookmarked => "http://activitystrea.ms/schema/1.0/save",
      Self::Unbookmarked => "http://activitystrea.ms/schema/1.0/unsave",
    }
  }

  /// English display string.
  pub fn display(self) -> &'static str {
    match self {
      Self::Commented => "commented on",
      Self::Bookmarked => "saved",
      Self::Unbookmarked => "unsaved",
      other => other.into(),
    }
  }

  /// The snake_case key used in configuration.
  pub fn key(self) -> &'static str { self.into() }

  /// Reverse lookup from a verb IRI.
  pub fn from_uri(uri: &str) -> Option<Self> {
    Self::iter().find(|k| k.uri() == uri)
  }

  /// A full [`Verb`] with an English display map.
  pub fn verb(self) -> Verb { Verb::new(self.uri(), self.display()) }
}

impl From<VerbKey> for Verb {
  fn from(key: VerbKey) -> Self { key.verb() }
}
