//! # EduScout Common Library
//!
//! Shared code for the EduScout crates:
//! - Error and result types
//! - Config file resolution, TOML loading and atomic file writes

pub mod config;
pub mod error;

pub use error::{Error, Result};
