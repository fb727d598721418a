//! HTTP transport to a Learning Record Store.
//!
//! [`LrsClient`] implements [`xapi_pipeline::Transport`] over the xAPI
//! resources: statement batches are posted to `{endpoint}/statements`, single
//! statements are put by id, and reads are passed through. Every request
//! carries basic auth and the `X-Experience-API-Version` header.

mod client;

pub mod error;

pub use client::{LrsClient, LrsConfig};
pub use error::{Result, TransportError};
