//! Actor identity resolution: platform user ⇄ xAPI actor.
//!
//! A user can be described by several Inverse Functional Identifiers. Which
//! one the site emits is decided by an ordered list of [`IfiStrategy`]s built
//! once at startup from configuration. The UUID account strategy applies to
//! every user and is appended last unless configured explicitly.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use xapi_core::{
  Actor, Ifi,
  platform::User,
  store::UserDirectory,
};

use crate::{Error, Result, Site};

// ─── Strategies ──────────────────────────────────────────────────────────────

/// How a [`IfiStrategy`] wants a user looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
  ByUuid(Uuid),
  ByEmail(String),
  ByOrganizationIdentifier(String),
}

/// One way of naming a user as an xAPI actor.
///
/// Strategies are pure: they never touch storage. Reverse lookups are
/// expressed as a [`UserLookup`] that the resolver runs against the
/// [`UserDirectory`].
pub trait IfiStrategy: Send + Sync {
  /// Configuration id of this strategy.
  fn id(&self) -> &'static str;

  /// The IFI for `user`, or `None` if the user lacks the attributes this
  /// strategy needs.
  fn ifi(&self, user: &User) -> Option<Ifi>;

  /// Whether `actor` has the shape this strategy produces.
  fn is_mine(&self, actor: &Actor) -> bool;

  /// How to find the user behind `actor`.
  fn lookup(&self, actor: &Actor) -> Option<UserLookup>;
}

/// `account { name: <user uuid>, homePage: <site base url> }`.
pub struct UuidAccount {
  home_page: String,
}

impl UuidAccount {
  pub const ID: &'static str = "uuid_account";

  pub fn new(site: &Site) -> Self {
    Self {
      home_page: site.base().to_string(),
    }
  }
}

impl IfiStrategy for UuidAccount {
  fn id(&self) -> &'static str { Self::ID }

  fn ifi(&self, user: &User) -> Option<Ifi> {
    Some(Ifi::account(user.uuid.to_string(), self.home_page.clone()))
  }

  fn is_mine(&self, actor: &Actor) -> bool { actor.ifi.as_account().is_some() }

  fn lookup(&self, actor: &Actor) -> Option<UserLookup> {
    let account = actor.ifi.as_account()?;
    Uuid::parse_str(&account.name).ok().map(UserLookup::ByUuid)
  }
}

/// `account { name: <organization identifier>, homePage: <organization
/// homepage> }`, for users provisioned through an organization's SSO.
pub struct OrganizationAccount;

impl OrganizationAccount {
  pub const ID: &'static str = "organization_account";
}

impl IfiStrategy for OrganizationAccount {
  fn id(&self) -> &'static str { Self::ID }

  fn ifi(&self, user: &User) -> Option<Ifi> {
    let name = user.organization_identifier()?;
    let home_page = user.organization_homepage()?;
    Some(Ifi::account(name, home_page))
  }

  fn is_mine(&self, actor: &Actor) -> bool { actor.ifi.as_account().is_some() }

  fn lookup(&self, actor: &Actor) -> Option<UserLookup> {
    let account = actor.ifi.as_account()?;
    Some(UserLookup::ByOrganizationIdentifier(account.name.clone()))
  }
}

/// `mbox: mailto:<email>`.
pub struct Mbox;

impl Mbox {
  pub const ID: &'static str = "mbox";
}

impl IfiStrategy for Mbox {
  fn id(&self) -> &'static str { Self::ID }

  fn ifi(&self, user: &User) -> Option<Ifi> { user.email().map(Ifi::mbox_for) }

  fn is_mine(&self, actor: &Actor) -> bool { actor.ifi.email().is_some() }

  fn lookup(&self, actor: &Actor) -> Option<UserLookup> {
    actor
      .ifi
      .email()
      .filter(|email| !email.is_empty())
      .map(|email| UserLookup::ByEmail(email.to_string()))
  }
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// One configured strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
  pub id:       String,
  /// Higher runs first; ties keep declaration order.
  #[serde(default)]
  pub priority: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
  #[serde(default)]
  pub strategies: Vec<StrategyConfig>,
  /// Include the user's display name in emitted actors.
  #[serde(default)]
  pub real_name:  bool,
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Result of mapping an actor back to a platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
  Known(User),
  NotFound,
}

impl Identity {
  pub fn user(&self) -> Option<&User> {
    match self {
      Self::Known(user) => Some(user),
      Self::NotFound => None,
    }
  }
}

pub struct IdentityResolver {
  strategies: Vec<Arc<dyn IfiStrategy>>,
  real_name:  bool,
}

impl IdentityResolver {
  /// Build the strategy list from configuration. Unknown or repeated ids are
  /// rejected. The baseline UUID account strategy is appended when it is not
  /// configured.
  pub fn from_config(config: &IdentityConfig, site: &Site) -> Result<Self> {
    let mut configured: Vec<&StrategyConfig> = Vec::new();
    for entry in &config.strategies {
      if configured.iter().any(|c| c.id == entry.id) {
        return Err(Error::DuplicateStrategy(entry.id.clone()));
      }
      configured.push(entry);
    }
    // Stable: equal priorities keep declaration order.
    configured.sort_by_key(|c| std::cmp::Reverse(c.priority));

    let mut strategies = configured
      .into_iter()
      .map(|c| builtin(&c.id, site))
      .collect::<Result<Vec<_>>>()?;
    if !strategies.iter().any(|s| s.id() == UuidAccount::ID) {
      strategies.push(Arc::new(UuidAccount::new(site)));
    }

    Ok(Self {
      strategies,
      real_name: config.real_name,
    })
  }

  /// Use an explicit, already ordered strategy list. The baseline is
  /// appended when missing.
  pub fn new(mut strategies: Vec<Arc<dyn IfiStrategy>>, site: &Site) -> Self {
    if !strategies.iter().any(|s| s.id() == UuidAccount::ID) {
      strategies.push(Arc::new(UuidAccount::new(site)));
    }
    Self {
      strategies,
      real_name: false,
    }
  }

  pub fn with_real_name(mut self, real_name: bool) -> Self {
    self.real_name = real_name;
    self
  }

  /// Strategy ids in the order they are consulted.
  pub fn order(&self) -> Vec<&'static str> {
    self.strategies.iter().map(|s| s.id()).collect()
  }

  /// The IFI the site uses for `user`: the first strategy able to describe
  /// the user.
  pub fn resolve(&self, user: &User) -> Ifi {
    self
      .strategies
      .iter()
      .find_map(|s| s.ifi(user))
      .unwrap_or_else(|| Ifi::account(user.uuid.to_string(), String::new()))
  }

  pub fn actor_for(&self, user: &User) -> Actor {
    let actor = Actor::new(self.resolve(user));
    match user.display_name() {
      Some(name) if self.real_name => actor.with_name(name),
      _ => actor,
    }
  }

  /// Map `actor` back to a platform user.
  ///
  /// Every strategy recognizing the actor's shape performs its lookup, in
  /// order, until one finds the user. Directory failures are logged and
  /// count as not found.
  pub async fn identify<D>(&self, actor: &Actor, directory: &D) -> Identity
  where
    D: UserDirectory,
  {
    for strategy in self.strategies.iter().filter(|s| s.is_mine(actor)) {
      if let Some(user) = run_lookup(strategy.as_ref(), actor, directory).await {
        return Identity::Known(user);
      }
    }
    Identity::NotFound
  }
}

fn builtin(id: &str, site: &Site) -> Result<Arc<dyn IfiStrategy>> {
  Ok(match id {
    UuidAccount::ID => Arc::new(UuidAccount::new(site)),
    OrganizationAccount::ID => Arc::new(OrganizationAccount),
    Mbox::ID => Arc::new(Mbox),
    other => return Err(Error::UnknownStrategy(other.to_string())),
  })
}

async fn run_lookup<D>(
  strategy: &dyn IfiStrategy,
  actor: &Actor,
  directory: &D,
) -> Option<User>
where
  D: UserDirectory,
{
  let lookup = strategy.lookup(actor)?;
  let found = match &lookup {
    UserLookup::ByUuid(uuid) => directory.find_by_uuid(*uuid).await,
    UserLookup::ByEmail(email) => directory.find_by_email(email).await,
    UserLookup::ByOrganizationIdentifier(id) => {
      directory.find_by_organization_identifier(id).await
    }
  };
  match found {
    Ok(user) => user,
    Err(e) => {
      tracing::error!(strategy = strategy.id(), ?lookup, "user lookup failed: {e}");
      None
    }
  }
}
