//! HTTP server module.
//!
//! Provides the plain-HTTP server (TLS is expected to be terminated by the
//! platform in front of the service), graceful shutdown on SIGTERM/SIGINT, and
//! the CORS allow-list applied to the API routes.

pub mod cors;
mod server;
mod shutdown;

pub use server::{start_server, ServerError};
