//! # Rebook API Server Library
//!
//! HTTP surface of Rebook: customer and visit management, message templates,
//! follow-up campaigns and the reminder dispatch endpoint.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
