//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{LoadRequest, SetRequest};
pub use responses::{
    DeleteResponse, ErrorResponse, GetResponse, HasResponse, HealthResponse, KeysResponse,
    LoadResponse, PopResponse, PruneResponse, ResetResponse, SetResponse, StatsResponse,
    TtlResponse,
};
