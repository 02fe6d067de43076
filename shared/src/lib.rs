//! Shared types and domain model for the Warehouse Operations Platform
//!
//! This crate contains the entities, lifecycle state machines and derived-field
//! rules shared between the backend, the dashboard client and the WASM module.

#[macro_use]
mod macros;

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod requests;
pub mod types;
pub mod validation;

pub use error::*;
pub use lifecycle::*;
pub use models::*;
pub use requests::*;
pub use types::*;
pub use validation::*;
