//! Applying [`TemplateParams`] to a template statement.

use url::Url;
use xapi_core::{ActivityDefinition, Actor, Statement};

use crate::TemplateParams;

/// A rewritten statement, plus the endpoint override (if any) the caller
/// should send it to.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten {
  pub statement: Statement,
  pub endpoint:  Option<String>,
}

/// Apply `params` to `template`.
///
/// - `activity_id`: replaces `object.id` when it differs. If the old and new
///   ids are URLs with the same path, every occurrence of the old origin in
///   the statement is replaced by the new origin; otherwise no other IRI is
///   touched.
/// - `actor`, `definition`: parsed as JSON and substituted; unparseable
///   values are ignored.
/// - `endpoint`: returned as-is in [`Rewritten::endpoint`].
///
/// Applying the same parameters to the output again yields the same output.
pub fn rewrite(template: &Statement, params: &TemplateParams) -> Rewritten {
  let mut statement = template.clone();

  if let Some(activity_id) = &params.activity_id
    && *activity_id != statement.object.id
  {
    statement = rewrite_iris(statement, activity_id);
  }

  if let Some(raw) = &params.actor {
    match serde_json::from_str::<Actor>(raw) {
      Ok(actor) => statement.actor = actor,
      Err(e) => tracing::debug!("ignoring malformed actor parameter: {e}"),
    }
  }

  if let Some(raw) = &params.definition {
    match serde_json::from_str::<ActivityDefinition>(raw) {
      Ok(definition) => statement.object.definition = Some(definition),
      Err(e) => tracing::debug!("ignoring malformed definition parameter: {e}"),
    }
  }

  Rewritten {
    statement,
    endpoint: params.endpoint.clone(),
  }
}

fn rewrite_iris(statement: Statement, new_id: &str) -> Statement {
  let old_id = statement.object.id.clone();
  let mut rewritten = substitute_origin(statement, &old_id, new_id);
  rewritten.object.id = new_id.to_string();
  rewritten
}

/// The statement with the origin of `old_id` swapped for the origin of
/// `new_id`, when both are URLs sharing a path. Otherwise unchanged.
fn substitute_origin(statement: Statement, old_id: &str, new_id: &str) -> Statement {
  let (Ok(old), Ok(new)) = (Url::parse(old_id), Url::parse(new_id)) else {
    tracing::debug!(%old_id, %new_id, "activity ids are not both URLs");
    return statement;
  };
  if old.path() != new.path() {
    tracing::debug!(%old_id, %new_id, "activity paths differ; keeping IRIs");
    return statement;
  }

  let old_origin = old.origin().ascii_serialization();
  let new_origin = new.origin().ascii_serialization();
  if old_origin == new_origin {
    return statement;
  }

  let substituted = serde_json::to_string(&statement)
    .map(|json| replace_origin(&json, &old_origin, &new_origin))
    .and_then(|json| serde_json::from_str::<Statement>(&json));
  match substituted {
    Ok(rewritten) => rewritten,
    Err(e) => {
      tracing::debug!("origin substitution failed, keeping object id only: {e}");
      statement
    }
  }
}

/// Replace `old` with `new` where `old` is a whole origin: followed by a
/// path, query, fragment, the end of a JSON string or the end of input.
/// `https://a.example` inside `https://a.example.net` is left alone.
fn replace_origin(json: &str, old: &str, new: &str) -> String {
  let mut out = String::with_capacity(json.len());
  let mut rest = json;
  while let Some(at) = rest.find(old) {
    let end = at + old.len();
    let whole = rest[end..]
      .chars()
      .next()
      .is_none_or(|c| matches!(c, '/' | '?' | '#' | '"'));
    out.push_str(&rest[..at]);
    out.push_str(if whole { new } else { old });
    rest = &rest[end..];
  }
  out.push_str(rest);
  out
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use xapi_core::{Activity, Ifi, Verb};

  use super::*;

  const OLD: &str = "https://old.example/node/5";

  fn template() -> Statement {
    let mut statement = Statement::new(
      Actor::new(Ifi::mbox_for("placeholder@old.example")),
      Verb::new("http://adlnet.gov/expapi/verbs/experienced", "experienced"),
      Activity::new(OLD),
    );
    statement.context_mut().context_activities.parent =
      vec![Activity::new("https://old.example/node/1")];
    statement
  }

  fn with_activity(id: &str) -> TemplateParams {
    TemplateParams {
      activity_id: Some(id.into()),
      ..TemplateParams::default()
    }
  }

  #[test]
  fn same_path_replaces_the_origin_everywhere() {
    let out = rewrite(&template(), &with_activity("https://new.example/node/5"));
    let statement = out.statement;
    assert_eq!(statement.object.id, "https://new.example/node/5");
    let context = statement.context.unwrap();
    assert_eq!(
      context.context_activities.parent[0].id,
      "https://new.example/node/1"
    );
    assert_eq!(
      statement.actor.ifi,
      Ifi::Mbox("mailto:placeholder@old.example".into())
    );
  }

  #[test]
  fn different_path_only_replaces_the_object_id() {
    let out = rewrite(&template(), &with_activity("https://new.example/node/9"));
    assert_eq!(out.statement.object.id, "https://new.example/node/9");
    let context = out.statement.context.unwrap();
    assert_eq!(
      context.context_activities.parent[0].id,
      "https://old.example/node/1"
    );
  }

  #[test]
  fn origin_extended_by_the_new_host_is_replaced_once() {
    let mut template = template();
    template.object.definition = Some(xapi_core::ActivityDefinition {
      more_info: Some("https://old.example.net/about".into()),
      ..Default::default()
    });
    let params = with_activity("https://old.example.net/node/5");

    let once = rewrite(&template, &params).statement;
    assert_eq!(once.object.id, "https://old.example.net/node/5");
    let parent = &once.context.as_ref().unwrap().context_activities.parent[0];
    assert_eq!(parent.id, "https://old.example.net/node/1");
    assert_eq!(
      once.object.definition.as_ref().unwrap().more_info.as_deref(),
      Some("https://old.example.net/about")
    );

    let twice = rewrite(&once, &params).statement;
    assert_eq!(once, twice);
  }

  #[test]
  fn origin_is_only_replaced_at_an_iri_boundary() {
    assert_eq!(
      replace_origin(
        r#"["https://a.example","https://a.example/x","https://a.example.net/y","https://a.example?q"]"#,
        "https://a.example",
        "https://b.example",
      ),
      r#"["https://b.example","https://b.example/x","https://a.example.net/y","https://b.example?q"]"#
    );
  }

  #[test]
  fn non_url_activity_id_only_replaces_the_object_id() {
    let out = rewrite(&template(), &with_activity("urn:uuid:1234"));
    assert_eq!(out.statement.object.id, "urn:uuid:1234");
    let context = out.statement.context.unwrap();
    assert_eq!(
      context.context_activities.parent[0].id,
      "https://old.example/node/1"
    );
  }

  #[test]
  fn malformed_actor_is_ignored() {
    let params = TemplateParams {
      actor: Some("{not json".into()),
      ..TemplateParams::default()
    };
    let out = rewrite(&template(), &params);
    assert_eq!(out.statement, template());
  }

  #[test]
  fn actor_with_ambiguous_ifi_is_ignored() {
    let params = TemplateParams {
      actor: Some(
        json!({
          "mbox": "mailto:a@example.com",
          "account": { "name": "a", "homePage": "https://sso.example" }
        })
        .to_string(),
      ),
      ..TemplateParams::default()
    };
    assert_eq!(rewrite(&template(), &params).statement, template());
  }

  #[test]
  fn actor_and_definition_are_substituted() {
    let params = TemplateParams {
      actor: Some(
        json!({ "account": { "name": "u-1", "homePage": "https://lms.example" } })
          .to_string(),
      ),
      definition: Some(
        json!({ "type": "http://adlnet.gov/expapi/activities/course" }).to_string(),
      ),
      ..TemplateParams::default()
    };
    let out = rewrite(&template(), &params).statement;
    assert_eq!(out.actor.ifi, Ifi::account("u-1", "https://lms.example"));
    assert_eq!(
      out.object.kind(),
      Some("http://adlnet.gov/expapi/activities/course")
    );
  }

  #[test]
  fn endpoint_is_returned_without_touching_the_statement() {
    let params = TemplateParams {
      endpoint: Some("https://lrs.example/xapi".into()),
      ..TemplateParams::default()
    };
    let out = rewrite(&template(), &params);
    assert_eq!(out.endpoint.as_deref(), Some("https://lrs.example/xapi"));
    assert_eq!(out.statement, template());
  }

  #[test]
  fn rewriting_is_idempotent() {
    let params = TemplateParams {
      activity_id: Some("https://new.example/node/5".into()),
      actor: Some(json!({ "mbox": "mailto:l@new.example" }).to_string()),
      definition: Some(json!({ "name": { "en": "Intro" } }).to_string()),
      endpoint: Some("https://lrs.example/xapi".into()),
    };
    let once = rewrite(&template(), &params);
    let twice = rewrite(&once.statement, &params);
    assert_eq!(once, twice);
  }
}
