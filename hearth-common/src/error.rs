//! Error type shared by the hearth crates
//!
//! `NotFound` and `InvalidInput` carry messages meant for the member who made the
//! request; the HTTP layer returns them verbatim as 404 / 400 bodies.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database file, photo storage or config file access
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable or contradictory `hearth.toml`
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile, event, task or other row absent
    #[error("{0}")]
    NotFound(String),

    /// Rejected date, time, phone number or vocabulary value
    #[error("{0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
