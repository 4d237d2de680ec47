//! # Rebook Shared Library
//!
//! This crate contains the domain types, persistence layer and integrations
//! used by the Rebook API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `db`: Connection pooling and migrations
//! - `store`: The `Store` seam with PostgreSQL and in-memory backends
//! - `retention`: Due-customer selection, message composition and dispatch
//! - `whatsapp`: WhatsApp Business Platform client
//! - `auth`: Tokens, identity provider and auth-state events

pub mod auth;
pub mod db;
pub mod models;
pub mod retention;
pub mod store;
pub mod whatsapp;

/// Current version of the Rebook shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
