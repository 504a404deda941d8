//! Materialisation engine
//!
//! Applies member graphs to a repository as replace-upserts: the stored
//! version of each entity, including the blank nodes it owns, is deleted
//! and the new version inserted within one transaction.

mod config;
mod error;
mod materialiser;

pub use config::{DeletionScope, MaterialiserConfig};
pub use error::MaterialisationError;
pub use materialiser::Materialiser;
