//! Public API contracts: errors, types and backend traits.

pub mod error;
pub mod traits;
pub mod types;
