/// Middleware for the API server
///
/// JWT authentication lives next to the router in [`crate::app`]; this module
/// holds the tower layers that apply to every response.

pub mod security;
