//! HTTP surface for the FlowCart checkout and warehouse services.
//!
//! Request bodies are explicit typed structs validated at the boundary;
//! every response uses the `{success, data | error}` envelope. The
//! authenticated identity arrives from the gateway in headers, already
//! validated.

pub mod auth;
pub mod config;
pub mod envelope;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use routes::router;
pub use state::AppState;
