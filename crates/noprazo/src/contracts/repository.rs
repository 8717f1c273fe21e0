use chrono::NaiveDate;

use super::domain::{Contract, ContractHistory, ContractId};

/// Storage abstraction so the service and batch drivers can be exercised in
/// isolation. Each call is atomic for a single contract; no cross-contract
/// transaction is assumed.
pub trait ContractRepository: Send + Sync {
    /// All stored records with their raw dates; no derived status.
    fn list(&self) -> Result<Vec<Contract>, RepositoryError>;
    fn fetch(&self, id: &ContractId) -> Result<Option<Contract>, RepositoryError>;
    fn insert(&self, contract: Contract) -> Result<Contract, RepositoryError>;
    fn update(&self, contract: Contract) -> Result<(), RepositoryError>;
    /// Advances a contract into its next period, keyed by id so duplicate
    /// driver runs upsert rather than double-apply.
    fn save_renewal(
        &self,
        id: &ContractId,
        new_start: NaiveDate,
        new_end: NaiveDate,
        new_renewal_date: NaiveDate,
    ) -> Result<(), RepositoryError>;
    fn delete(&self, id: &ContractId) -> Result<(), RepositoryError>;
    /// Appends an immutable audit entry. Never overwrites existing history.
    fn append_history(&self, entry: ContractHistory) -> Result<(), RepositoryError>;
    /// Audit entries for one contract, newest first. History is retained
    /// even after the contract itself is deleted.
    fn history_for(&self, id: &ContractId) -> Result<Vec<ContractHistory>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound message delivery boundary (e-mail or otherwise). The core only
/// hands over `(recipient, subject, body)` triples; retry policy belongs to
/// the transport or the driver.
pub trait NotificationSender: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError>;
}

/// Message dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
