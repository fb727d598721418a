//! Collaborator traits implemented by the host application.
//!
//! The pipeline never owns users, content or flags. It reads and writes them
//! through these traits; `xapi-memory` provides in-process implementations.
//!
//! All methods return `Send` futures so the traits can be used from a
//! multi-threaded tokio runtime (e.g. behind `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::platform::{Content, Flagging, User};

/// Read access to platform accounts.
pub trait UserDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn find_by_uuid(
    &self,
    uuid: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by email address.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn find_by_organization_identifier<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;
}

/// Read access to the entities statements are about.
pub trait ContentCatalog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get<'a>(
    &'a self,
    content_id: &'a str,
  ) -> impl Future<Output = Result<Option<Content>, Self::Error>> + Send + 'a;

  /// Find the content whose activity IRI (canonical URL) is `activity_id`.
  fn find_by_activity_id<'a>(
    &'a self,
    activity_id: &'a str,
  ) -> impl Future<Output = Result<Option<Content>, Self::Error>> + Send + 'a;
}

/// Per-user flags on content.
pub trait FlagStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn is_flagged<'a>(
    &'a self,
    flag: &'a str,
    content_id: &'a str,
    user: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Record `flagging`. Returns `false` if it was already present.
  fn flag(
    &self,
    flagging: Flagging,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove a flagging. Returns `false` if there was nothing to remove.
  fn unflag<'a>(
    &'a self,
    flag: &'a str,
    content_id: &'a str,
    user: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
