//! Persistence queries, one module per table

pub mod announcements;
pub mod events;
pub mod memories;
pub mod notes;
pub mod profiles;
pub mod sessions;
pub mod settings;
pub mod tasks;
