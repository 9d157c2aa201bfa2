//! Payment orchestration.
//!
//! A request moves through one routing lookup and, only if that succeeds,
//! one provider submission. See [`coordinator`] for the state machine.

pub mod context;
pub mod coordinator;
pub mod error;
pub mod types;

pub use context::RequestContext;
pub use coordinator::{Coordinator, OrchestrationState};
pub use error::{OrchestrationError, Stage};
pub use types::{PaymentOutcome, PaymentRequest, PaymentStatus};
