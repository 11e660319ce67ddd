//! REST client module for the fitness data service.
//!
//! This module provides the `ApiClient` for fetching the exercise catalog
//! and per-user data, and for the small set of mutations (completions,
//! notes) the client performs.
//!
//! Requests carry a bearer token issued by the service's auth provider.
//! Read endpoints are idempotent and are the only ones fronted by the
//! local cache.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
