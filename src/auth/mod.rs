//! Session handling for the data service's external auth provider.
//!
//! The provider itself is out of scope: the client only carries the opaque
//! bearer token and user id it issued, persisted locally with expiry
//! checking. Tokens can also be supplied through the `FITCACHE_TOKEN` and
//! `FITCACHE_USER` environment variables.

pub mod session;

pub use session::{Session, SessionData};
