//! # Hearth Common Library
//!
//! Shared code for the hearth family board service:
//! - Error and result types
//! - Configuration loading (root folder, TOML, credentials)
//! - Date and age helpers
//! - Phone number validation
//! - Database schema and row models

pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod phone;

pub use error::{Error, Result};
