//! Core types and trait definitions for the xAPI statement pipeline.
//!
//! This crate is deliberately free of HTTP and storage dependencies. It holds
//! the statement data model, the verb catalogue, the platform-side user and
//! content types, and the collaborator traits the host application
//! implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod platform;
pub mod serde_helpers;
pub mod statement;
pub mod store;
pub mod verb;

pub use error::{Error, Result};
pub use statement::{
  Account, Activity, ActivityDefinition, Actor, Context, ContextActivities,
  Ifi, LanguageMap, Score, Statement, StatementResult, Verb, XAPI_VERSION,
};
pub use platform::{Content, Flagging, User};
pub use verb::VerbKey;
