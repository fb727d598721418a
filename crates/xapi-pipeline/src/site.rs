//! The site statements are recorded on behalf of.

use serde::Deserialize;

/// Identity of the platform emitting statements.
#[derive(Debug, Clone, Deserialize)]
pub struct Site {
  /// Human-readable site name; also the system actor's account name.
  pub name:     String,
  /// Absolute base URL, e.g. `https://lms.example`.
  pub base_url: String,
  /// Deployment identifier reported in `context.platform`.
  #[serde(default = "default_version")]
  pub version:  String,
}

fn default_version() -> String { "dev".to_string() }

impl Site {
  pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
    Self {
      name:     name.into(),
      base_url: base_url.into(),
      version:  default_version(),
    }
  }

  /// Base URL without a trailing slash.
  pub fn base(&self) -> &str { self.base_url.trim_end_matches('/') }

  /// `"{name} ({version}); {domain}"`, where the domain is the base URL's
  /// scheme and host (or the raw base URL if it does not parse).
  pub fn platform(&self) -> String {
    let domain = url::Url::parse(&self.base_url)
      .map(|u| u.origin().ascii_serialization())
      .unwrap_or_else(|_| self.base().to_string());
    format!("{} ({}); {}", self.name, self.version, domain)
  }
}
