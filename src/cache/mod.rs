//! Local caching of data-service responses.
//!
//! Every dataset the client fetches goes through one `SwrCache`, each bound
//! to its own storage key and time-to-live. Reads serve fresh entries;
//! expired entries stay reachable through the stale fallback so a failed
//! live fetch can still show the last-known data.
//!
//! Cached datasets include:
//! - Exercise groups and per-category exercise lists (slow-moving catalog)
//! - Per-user training days, completions, notes, and imbalance images

pub mod swr;

pub use swr::{CacheEntry, SwrCache};
