//! Archetype Sync Core - Shared domain types.
//!
//! Used by:
//! - `sync` - the HTTP service that writes quiz archetypes to customer metafields
//! - `cli` - operator commands that run the same sync once
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Parsing and
//! validation of request input happens here so both binaries agree on it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, archetypes, customer ids and metafield targets

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
