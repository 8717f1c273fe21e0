//! Contract lifecycle core for the NoPrazo contract-control service.
//!
//! The `contracts` module holds the business rules: deriving a lifecycle
//! status from contract dates, deciding when an expiry reminder fires,
//! rolling auto-renewing contracts into their next period, and producing
//! field-level audit diffs. Persistence and e-mail transport are trait
//! boundaries implemented by the consuming service.

pub mod config;
pub mod contracts;
pub mod error;
pub mod telemetry;
