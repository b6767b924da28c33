//! Request-level services behind the HTTP handlers.

pub mod batch;
pub mod intake;
pub mod notifier;
pub mod receipt;
pub mod updates;

pub use batch::BatchUpdateCoordinator;
pub use notifier::{HttpMailNotifier, LogNotifier};
