//! Core types and validation logic for the schema index registry.
//!
//! This crate is deliberately free of HTTP-server and database dependencies.
//! It owns the domain model, the URL validation pipeline (fetch, classify,
//! normalise, conflict search) and the management workflows built on top of
//! it. Storage backends implement [`store::RegistryStore`]; network access
//! goes through [`fetch::UrlFetcher`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod conflict;
pub mod error;
pub mod fetch;
pub mod format;
pub mod manage;
pub mod permalink;
pub mod provider;
pub mod schema;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
