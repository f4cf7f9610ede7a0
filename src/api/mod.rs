//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value and mark it used
//! - `GET /peek/:key` - Retrieve a value without marking it used
//! - `GET /has/:key` - Check for a fresh value
//! - `GET /ttl/:key` - Time left before a value goes stale
//! - `DELETE /del/:key` - Delete a key
//! - `POST /pop` - Remove the least recently used entry
//! - `POST /reset` - Dispose of every entry
//! - `POST /prune` - Remove stale entries
//! - `GET /keys` - List keys, most recently used first
//! - `GET /dump` - Export fresh entries
//! - `POST /load` - Replace contents with a dump
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
