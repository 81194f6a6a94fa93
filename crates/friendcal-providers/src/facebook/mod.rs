//! Facebook birthday source.
//!
//! - [`auth`] logs in with email and password
//! - [`FacebookClient`] owns the session and caches tokens and locale
//! - [`graphql`] and [`extract`] decode the two listing formats

pub mod auth;
mod client;
mod config;
pub mod extract;
pub mod graphql;

pub use client::FacebookClient;
pub use config::{BirthdaySource, FacebookConfig};
pub use extract::{ProfileToken, RawEntry};

/// Provider name attached to errors.
pub const PROVIDER_NAME: &str = "facebook";
