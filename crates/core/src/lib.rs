//! Core types and configuration for the delivery analytics system.
//!
//! This crate provides shared types used across all other crates:
//! - Daily delivery records and calendar periods
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
