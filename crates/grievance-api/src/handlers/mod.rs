//! HTTP handlers.

pub mod attachments;
pub mod batch;
pub mod categorization;
pub mod grievances;
pub mod health;
pub mod sync;
