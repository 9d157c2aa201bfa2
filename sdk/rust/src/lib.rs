//! Client for the payment orchestrator HTTP API.

mod client;

pub use client::{ClientError, CreatePayment, OrchestratorClient, PaymentReceipt};
