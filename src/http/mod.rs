//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, per-route handlers)
//!     → pipeline (gate chain decides the terminal outcome)
//!     → response.rs (envelope serialization, CORS)
//!     → Send to client
//! ```

pub mod messages;
pub mod response;
pub mod server;

pub use response::ResponseEnvelope;
pub use server::{AppState, GatewayServer};
