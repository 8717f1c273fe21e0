//! Contract lifecycle rules and the service that applies them.
//!
//! The pure pieces live in `status` (lifecycle classification), `notification`
//! (reminder trigger and template rendering), `renewal` (auto-rollover period
//! math), and `history` (audit diffing). `repository` defines the persistence
//! and transport boundaries; `service` composes everything for the CRUD paths
//! and the two scheduled batch sweeps; `router` exposes the HTTP surface.

pub mod domain;
pub mod history;
pub mod notification;
pub mod renewal;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use domain::{
    Contract, ContractDraft, ContractHistory, ContractId, ContractStatus, HistoryAction,
    ValidationError,
};
pub use notification::{
    reminder, reminders_due, render_message, should_notify, ReminderNotice, DEFAULT_TEMPLATE,
};
pub use renewal::{renewals_due, RenewalBatch, RenewalInstruction, RenewalRejection};
pub use repository::{
    ContractRepository, NotificationSender, RepositoryError, SendError,
};
pub use router::contract_router;
pub use service::{
    BatchFailure, ContractService, ContractServiceError, NotificationRunReport, RenewalRunReport,
    NOTIFIED_MARKER,
};
pub use status::{alert_date, classify, Clock, FixedClock, SystemClock};
