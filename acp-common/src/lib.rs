//! # ACP Common Library
//!
//! Shared code for the ACP (Article Content Pipeline) services:
//! - Common error types
//! - Configuration loading and root folder resolution
//! - The canonical production `Phase` enum and its forward order

pub mod config;
pub mod error;
pub mod phase;

pub use error::{Error, Result};
pub use phase::{Phase, PHASE_ORDER};
