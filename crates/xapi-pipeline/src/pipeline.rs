//! The assembled pipeline: builder, state engine and dispatcher wired to the
//! host's collaborators.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use xapi_core::{
  Statement,
  platform::{Content, User},
  store::{ContentCatalog, FlagStore, UserDirectory},
};
use xapi_template::TemplateParams;

use crate::{
  DispatchError, Dispatched, Dispatcher, Error, FlagEvent, IdentityConfig,
  IdentityResolver, Result, Site, StateDefinition, StateEngine, StateRegistry,
  StatementBuilder,
  hooks::{ActorNormalizer, StatementValidator},
  transport::Transport,
};

/// Declarative pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
  pub site:     Site,
  #[serde(default)]
  pub identity: IdentityConfig,
  #[serde(default)]
  pub states:   Vec<StateDefinition>,
}

pub struct Pipeline<D, C, F, T> {
  identity:   Arc<IdentityResolver>,
  builder:    Arc<StatementBuilder>,
  states:     Arc<StateEngine<F>>,
  directory:  Arc<D>,
  catalog:    Arc<C>,
  dispatcher: Dispatcher<T>,
}

impl<D, C, F, T> Pipeline<D, C, F, T>
where
  D: UserDirectory + 'static,
  C: ContentCatalog,
  F: FlagStore,
  T: Transport,
{
  /// Wire the pipeline. The actor normalizer and statement validator hooks
  /// are installed on `dispatcher`.
  pub fn new(
    config: &PipelineConfig,
    directory: Arc<D>,
    catalog: Arc<C>,
    flags: Arc<F>,
    dispatcher: Dispatcher<T>,
  ) -> Result<Self> {
    let identity = Arc::new(IdentityResolver::from_config(&config.identity, &config.site)?);
    let builder = Arc::new(StatementBuilder::new(config.site.clone(), identity.clone()));
    let registry = Arc::new(StateRegistry::new(config.states.clone())?);
    let states = Arc::new(StateEngine::new(registry, builder.clone(), flags));
    let dispatcher = dispatcher
      .pre_hook(Arc::new(ActorNormalizer::new(identity.clone(), directory.clone())))
      .pre_hook(Arc::new(StatementValidator));

    Ok(Self {
      identity,
      builder,
      states,
      directory,
      catalog,
      dispatcher,
    })
  }

  pub fn identity(&self) -> &IdentityResolver { &self.identity }

  pub fn builder(&self) -> &StatementBuilder { &self.builder }

  pub fn states(&self) -> &StateEngine<F> { &self.states }

  pub fn directory(&self) -> &D { &self.directory }

  pub fn catalog(&self) -> &C { &self.catalog }

  pub fn dispatcher(&self) -> &Dispatcher<T> { &self.dispatcher }

  pub async fn dispatch(&self, draft: Statement) -> Result<Dispatched, DispatchError> {
    self.dispatcher.dispatch(draft).await
  }

  /// Send the statements a local flag change implies.
  pub async fn flag_changed(
    &self,
    event: &FlagEvent,
  ) -> Vec<Result<Dispatched, DispatchError>> {
    let drafts = self.states.on_flag_event(event);
    self.dispatcher.dispatch_all(drafts).await
  }

  /// Record a local flag change in the flag store and send the statements it
  /// implies. Nothing is sent when the flag was already in that state.
  pub async fn apply_flag(
    &self,
    event: &FlagEvent,
  ) -> Result<Vec<Result<Dispatched, DispatchError>>> {
    let drafts = self.states.apply(event).await?;
    Ok(self.dispatcher.dispatch_all(drafts).await)
  }

  /// Pass a read request for an LRS resource through unmodified.
  pub async fn query(&self, resource: &str, query: Option<&str>) -> Result<Value> {
    Ok(self.dispatcher.query(resource, query).await?)
  }

  /// Send the add-verb statement of `state_id` directly.
  pub async fn fire(
    &self,
    state_id: &str,
    content_id: Option<&str>,
    user: Option<Uuid>,
    at: Option<DateTime<Utc>>,
  ) -> Result<Dispatched> {
    let content = match content_id {
      Some(id) => Some(self.content(id).await?),
      None => None,
    };
    let user = match user {
      Some(uuid) => Some(self.user(uuid).await?),
      None => None,
    };
    let draft = self.states.fire(state_id, content.as_ref(), user.as_ref(), at)?;
    Ok(self.dispatcher.dispatch(draft).await?)
  }

  /// Rewrite a packaged template statement and send it.
  pub async fn replay(
    &self,
    template: &Statement,
    params: &TemplateParams,
  ) -> Result<Dispatched> {
    crate::replay::replay(&self.dispatcher, template, params).await
  }

  pub async fn content(&self, id: &str) -> Result<Content> {
    self
      .catalog
      .get(id)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?
      .ok_or_else(|| Error::UnknownContent(id.to_string()))
  }

  pub async fn user(&self, uuid: Uuid) -> Result<User> {
    self
      .directory
      .find_by_uuid(uuid)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?
      .ok_or(Error::UnknownUser(uuid))
  }
}
