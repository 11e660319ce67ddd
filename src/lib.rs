//! Client library for a hosted fitness-tracking service.
//!
//! Provides typed access to the service's exercise catalog and per-user
//! data, fronted by a local stale-while-revalidate cache so previously
//! seen data stays available when the service is unreachable:
//!
//! - [`api`]: authenticated REST client
//! - [`cache`]: the per-dataset stale-while-revalidate cache
//! - [`store`]: the persistent key-value backing the cache writes through
//! - [`models`]: exercises, groups, training days, completions, journal data
//! - [`auth`], [`config`]: session and configuration persistence
//! - [`app`]: the wired-together application used by the CLI

pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod store;
pub mod utils;
