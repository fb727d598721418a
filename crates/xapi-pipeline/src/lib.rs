//! The xAPI statement pipeline.
//!
//! Statements are built from platform events ([`builder`]), derived from
//! flag changes ([`state`]), enriched by ordered hooks and sent to a Learning
//! Record Store through a [`transport::Transport`] ([`dispatch`]). Statements
//! arriving from clients are validated, re-identified and mirrored back into
//! local flags before being relayed ([`received`]).
//!
//! [`Pipeline`] wires the pieces to the host's collaborators.

#![allow(async_fn_in_trait)]

pub mod activity;
pub mod builder;
pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod identity;
pub mod pipeline;
pub mod received;
pub mod replay;
pub mod site;
pub mod state;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use builder::StatementBuilder;
pub use dispatch::{Dispatched, Dispatcher, PostDispatch, PreDispatch};
pub use error::{DispatchError, Error, HookError, Result};
pub use identity::{Identity, IdentityConfig, IdentityResolver};
pub use pipeline::{Pipeline, PipelineConfig};
pub use site::Site;
pub use state::{FlagChange, FlagEvent, StateDefinition, StateEngine, StateRegistry};
pub use transport::{SendOutcome, Transport};
