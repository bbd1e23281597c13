//! The archetype sync pipeline.
//!
//! Finds the customer for an email (creating one when allowed), then writes
//! the archetype metafield on that customer.

mod directory;
mod request;
mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use directory::CustomerDirectory;
pub use request::{SyncPayload, SyncRequest};
pub use service::{SyncOutcome, SyncResponse, SyncService, SyncSettings, pick_match};
