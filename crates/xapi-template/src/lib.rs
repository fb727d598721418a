//! Rewriting of template statements replayed from offline packages.
//!
//! A packaged entity ships with a template statement whose IRIs point at the
//! site it was exported from. When the package is launched elsewhere, the
//! launcher passes the real activity id, actor, definition and LRS endpoint
//! as query parameters; [`rewrite`] applies them to the template.
//!
//! Everything here is pure and synchronous.

pub mod error;
pub mod params;
pub mod rewrite;

pub use error::{Error, Result};
pub use params::TemplateParams;
pub use rewrite::{Rewritten, rewrite};
