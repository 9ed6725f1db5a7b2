//! story-relay: turns a feature description into agile user stories.
//!
//! A small axum service that renders a fixed prompt template around the
//! caller's feature text, relays it to a generative-text provider (Gemini),
//! and returns the generated markdown.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod prompt;
pub mod provider;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
