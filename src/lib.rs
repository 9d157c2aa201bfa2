//! Payment orchestration service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestration;
pub mod upstream;

pub use config::OrchestratorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
