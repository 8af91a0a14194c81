//! bootstrap-core: Shared types, errors, and configuration
//!
//! This crate provides the foundational types used across the bootstrap workspace.

pub mod config;
pub mod errors;
pub mod risk;
pub mod types;

pub use config::*;
pub use errors::*;
pub use risk::RiskParams;
pub use types::*;
