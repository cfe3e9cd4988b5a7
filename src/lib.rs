//! Data Registry - a record registry with a write-through cache
//!
//! Records are persisted in a store, cached individually and as a
//! time-boxed list, and every change is announced on a notification queue.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use service::RecordService;
pub use tasks::spawn_cleanup_task;
