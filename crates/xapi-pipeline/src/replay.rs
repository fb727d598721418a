//! Replaying packaged template statements.

use xapi_core::Statement;
use xapi_template::{Rewritten, TemplateParams, rewrite};

use crate::{Dispatched, Dispatcher, Error, Result, transport::Transport};

/// Rewrite `template` with `params` and dispatch it, to the overriding
/// endpoint when one is given.
pub async fn replay<T: Transport>(
  dispatcher: &Dispatcher<T>,
  template: &Statement,
  params: &TemplateParams,
) -> Result<Dispatched> {
  let Rewritten {
    statement,
    endpoint,
  } = rewrite(template, params);

  match endpoint {
    Some(endpoint) => {
      let transport = dispatcher
        .transport()
        .retarget(&endpoint)
        .map_err(|e| Error::Retarget(Box::new(e)))?;
      tracing::debug!(%endpoint, "replaying to overriding endpoint");
      Ok(dispatcher.with_transport(transport).dispatch(statement).await?)
    }
    None => Ok(dispatcher.dispatch(statement).await?),
  }
}

#[cfg(test)]
mod tests {
  use xapi_core::{Activity, Actor, Ifi, Verb};

  use super::*;
  use crate::test_support::RecordingTransport;

  fn template() -> Statement {
    Statement::new(
      Actor::new(Ifi::mbox_for("placeholder@old.example")),
      Verb::new("http://adlnet.gov/expapi/verbs/experienced", "experienced"),
      Activity::new("https://old.example/node/5"),
    )
  }

  #[tokio::test]
  async fn replay_rewrites_then_dispatches() {
    let transport = RecordingTransport::default();
    let dispatcher = Dispatcher::new(transport.clone());
    let params = TemplateParams::from_query("activity_id=https://new.example/node/5");

    let dispatched = replay(&dispatcher, &template(), &params).await.unwrap();
    assert_eq!(dispatched.statement().object.id, "https://new.example/node/5");
    assert_eq!(transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn endpoint_override_leaves_the_default_transport_alone() {
    let transport = RecordingTransport::default();
    let dispatcher = Dispatcher::new(transport.clone());
    let params = TemplateParams::from_query("endpoint=https://lrs.other.example/xapi");

    replay(&dispatcher, &template(), &params).await.unwrap();
    dispatcher.dispatch(template()).await.unwrap();
    assert_eq!(
      transport.endpoints(),
      vec![Some("https://lrs.other.example/xapi".to_string()), None]
    );
  }
}
