//! Data model and DTOs for the registry API
//!
//! `record` holds the domain types shared by the store, cache and
//! notification layers; `requests`/`responses` are HTTP body shapes.

pub mod record;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use record::{NewRecord, Notification, Record};
pub use requests::RegisterRequest;
pub use responses::{ErrorResponse, HealthResponse, RemoveResponse, StatsResponse};
