//! API Module
//!
//! HTTP handlers and routing for the registry REST API.
//!
//! # Endpoints
//! - `POST /register` - Create a record
//! - `GET /data` - List all records
//! - `GET /data/:id` - Fetch one record
//! - `DELETE /data/:id` - Remove a record
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
