//! Core types for archetype sync.
//!
//! This module provides type-safe wrappers for the values that flow from the
//! quiz into the platform.

pub mod archetype;
pub mod customer_id;
pub mod email;
pub mod metafield;

pub use archetype::Archetype;
pub use customer_id::{CUSTOMER_GID_PREFIX, CustomerId};
pub use email::{Email, EmailError};
pub use metafield::{DEFAULT_KEY, DEFAULT_NAMESPACE, MetafieldKey, MetafieldKeyError, MetafieldType};
