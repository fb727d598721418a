//! In-process implementations of the pipeline's collaborator traits.
//!
//! [`MemoryStore`] holds users, content and flaggings behind read-write
//! locks. It backs the relay when no host application is attached and is the
//! store used throughout the test suites.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{Fixtures, MemoryStore};
