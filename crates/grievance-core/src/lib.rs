//! # grievance-core
//!
//! Core types, traits, and normalization rules for the grievance service.
//!
//! Everything here is storage- and transport-agnostic: the database crate
//! implements the repository traits and the API crate wires them to HTTP.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod id;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod taxonomy;
pub mod timestamps;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{screen_upload, ScreenedUpload, UploadRejection};
pub use id::GrievanceIdGenerator;
pub use models::*;
pub use normalize::{AttachmentsInput, GrievanceSubmission, NormalizedSubmission, Presence};
pub use taxonomy::{Categorization, Category, Confidence, Subcategory, Taxonomy};
pub use timestamps::{parse_timestamp, parse_timestamp_or, parse_timestamp_value, TimestampInput};
pub use traits::*;
