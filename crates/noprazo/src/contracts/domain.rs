use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Opaque stable contract identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractId(pub String);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored administrative state plus the three lifecycle states derived from
/// dates. The classifier only ever produces `Active`, `ExpiringSoon`, or
/// `Expired`; `Pending`, `Draft`, and `Cancelled` are set by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    ExpiringSoon,
    Expired,
    Pending,
    Draft,
    Cancelled,
}

impl ContractStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Ativo",
            Self::ExpiringSoon => "Expirando",
            Self::Expired => "Vencido",
            Self::Pending => "Pendente",
            Self::Draft => "Rascunho",
            Self::Cancelled => "Cancelado",
        }
    }
}

/// A vendor/legal contract record as stored by the repository. The `status`
/// field is the last persisted administrative state; lifecycle status is
/// always recomputed from the dates on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub reference: String,
    pub title: String,
    pub vendor: String,
    pub responsible_agent: String,
    pub value: f64,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub renewal_date: NaiveDate,
    pub notification_days: u32,
    pub auto_renewal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

impl Contract {
    /// Checks the temporal and monetary invariants of the record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start_date > self.end_date {
            return Err(ValidationError {
                contract_id: self.id.clone(),
                field: "start_date",
                reason: format!(
                    "start date {} falls after end date {}",
                    self.start_date, self.end_date
                ),
            });
        }
        if self.value < 0.0 {
            return Err(ValidationError {
                contract_id: self.id.clone(),
                field: "value",
                reason: format!("contract value {} is negative", self.value),
            });
        }
        Ok(())
    }

    /// Number of days covered by the current period.
    pub fn period_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Create payload; the service assigns the id and `#CT-xxxx` reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDraft {
    pub title: String,
    pub vendor: String,
    pub responsible_agent: String,
    pub value: f64,
    #[serde(default = "default_draft_status")]
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub renewal_date: NaiveDate,
    /// Absent means "use the configured default window" (7 days unless
    /// overridden), matching the original's fallback on read and send.
    #[serde(default)]
    pub notification_days: Option<u32>,
    #[serde(default)]
    pub auto_renewal: bool,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub custom_message: Option<String>,
}

fn default_draft_status() -> ContractStatus {
    ContractStatus::Active
}

/// Audit trail action recorded for each mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    Renewed,
    Deleted,
}

impl HistoryAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Renewed => "renewed",
            Self::Deleted => "deleted",
        }
    }
}

/// Append-only audit entry. `actor_id` is `None` for system-originated
/// actions (automatic renewals and reminder sends have no human author).
/// Entries are never updated or deleted; they outlive the parent contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractHistory {
    pub contract_id: ContractId,
    pub actor_id: Option<String>,
    pub action: HistoryAction,
    pub changes: BTreeMap<String, serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

/// Invariant violation on a stored or submitted contract, identifying the
/// offending record and field so a batch driver can skip it and continue.
#[derive(Debug, Clone, thiserror::Error)]
#[error("contract {contract_id}: invalid {field}: {reason}")]
pub struct ValidationError {
    pub contract_id: ContractId,
    pub field: &'static str,
    pub reason: String,
}
