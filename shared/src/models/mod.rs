//! Domain models for the Warehouse Operations Platform

pub mod equipment;
pub mod exception;
pub mod inventory;
pub mod picking;
pub mod quality;
pub mod receiving;
pub mod transfer;
pub mod workforce;

pub use equipment::*;
pub use exception::*;
pub use inventory::*;
pub use picking::*;
pub use quality::*;
pub use receiving::*;
pub use transfer::*;
pub use workforce::*;
