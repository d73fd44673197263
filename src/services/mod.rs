pub mod auth_service;
pub mod identity;
pub mod document_service;
pub mod presence_service;
pub mod session_sweeper;
pub mod sync_service;

pub use sync_service::{SyncService, SyncSettings};
