//! HTTP boundary.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, request tracing)
//!     → payments.rs (server span, request context)
//!     → request.rs (read body, decode, validate)
//!     → orchestration::Coordinator
//!     → response.rs (uniform error body)
//!     → Send to client
//! ```

pub mod payments;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ErrorBody;
pub use server::{AppState, BuildError, HttpServer};
