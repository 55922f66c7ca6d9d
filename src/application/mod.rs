//! Application layer
//!
//! Use cases translate caller-facing commands into domain inputs, run them
//! through the invoice orchestration service, and shape the results for
//! presentation.

pub mod invoice;
