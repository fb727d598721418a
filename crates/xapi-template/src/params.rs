//! Launch parameters carried in the package URL's query string.

use url::{Url, form_urlencoded};

use crate::Result;

/// Overrides for a template statement. Every member is optional; the raw
/// strings are kept as given and only interpreted by [`crate::rewrite`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParams {
  /// The activity IRI the statement should be about.
  pub activity_id: Option<String>,
  /// JSON-encoded actor.
  pub actor:       Option<String>,
  /// JSON-encoded activity definition.
  pub definition:  Option<String>,
  /// LRS endpoint statements should be sent to instead.
  pub endpoint:    Option<String>,
}

impl TemplateParams {
  /// Parse from a query string, with or without the leading `?`. Unknown
  /// keys are ignored; for repeated keys the last value wins.
  pub fn from_query(query: &str) -> Self {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = Self::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
      let slot = match key.as_ref() {
        "activity_id" => &mut params.activity_id,
        "actor" => &mut params.actor,
        "definition" => &mut params.definition,
        "endpoint" => &mut params.endpoint,
        _ => continue,
      };
      *slot = Some(value.into_owned());
    }
    params
  }

  /// Parse from a full launch URL.
  pub fn from_url(url: &str) -> Result<Self> {
    let url = Url::parse(url)?;
    Ok(Self::from_query(url.query().unwrap_or_default()))
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_known_keys_and_decodes_values() {
    let params = TemplateParams::from_query(
      "?activity_id=https%3A%2F%2Fnew.example%2Fnode%2F5&endpoint=https://lrs.example/xapi&utm=x",
    );
    assert_eq!(
      params.activity_id.as_deref(),
      Some("https://new.example/node/5")
    );
    assert_eq!(params.endpoint.as_deref(), Some("https://lrs.example/xapi"));
    assert_eq!(params.actor, None);
  }

  #[test]
  fn parses_from_launch_url() {
    let params = TemplateParams::from_url(
      "https://cdn.example/package/index.html?actor=%7B%7D",
    )
    .unwrap();
    assert_eq!(params.actor.as_deref(), Some("{}"));
  }

  #[test]
  fn url_without_query_yields_nothing() {
    let params =
      TemplateParams::from_url("https://cdn.example/index.html").unwrap();
    assert!(params.is_empty());
  }

  #[test]
  fn relative_url_is_an_error() {
    assert!(TemplateParams::from_url("/index.html?actor=x").is_err());
  }
}
