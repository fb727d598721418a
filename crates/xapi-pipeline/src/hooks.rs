//! Built-in dispatch hooks.

use std::sync::Arc;

use async_trait::async_trait;
use xapi_core::{Statement, store::UserDirectory};

use crate::{HookError, IdentityResolver, dispatch::PreDispatch, identity::Identity};

/// Rewrites the actor of statements about known users to the IFI the site
/// is configured to emit.
pub struct ActorNormalizer<D> {
  identity:  Arc<IdentityResolver>,
  directory: Arc<D>,
}

impl<D> ActorNormalizer<D> {
  pub const PRIORITY: i32 = 1000;

  pub fn new(identity: Arc<IdentityResolver>, directory: Arc<D>) -> Self {
    Self {
      identity,
      directory,
    }
  }
}

#[async_trait]
impl<D: UserDirectory> PreDispatch for ActorNormalizer<D> {
  fn name(&self) -> &str { "actor_normalizer" }

  fn priority(&self) -> i32 { Self::PRIORITY }

  async fn before_send(&self, statement: &mut Statement) -> Result<(), HookError> {
    if let Identity::Known(user) =
      self.identity.identify(&statement.actor, self.directory.as_ref()).await
    {
      statement.actor = self.identity.actor_for(&user);
    }
    Ok(())
  }
}

/// Rejects statements without a verb id or an object id.
pub struct StatementValidator;

impl StatementValidator {
  pub const PRIORITY: i32 = 900;
}

#[async_trait]
impl PreDispatch for StatementValidator {
  fn name(&self) -> &str { "statement_validator" }

  fn priority(&self) -> i32 { Self::PRIORITY }

  async fn before_send(&self, statement: &mut Statement) -> Result<(), HookError> {
    if statement.verb.id.trim().is_empty() {
      return Err(HookError::Veto("statement has no verb id".into()));
    }
    if statement.object.id.trim().is_empty() {
      return Err(HookError::Veto("statement has no object id".into()));
    }
    Ok(())
  }
}
