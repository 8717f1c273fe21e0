use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use super::domain::{Contract, ContractHistory, ContractId, HistoryAction};

/// Field-level changeset between two versions of a contract: a field is
/// present iff its value actually differs. The tracked set is deliberately
/// just {title, status, value} so history entries stay readable; opaque and
/// internal fields are never diffed. Text compares exactly, the monetary
/// value numerically, and status as the enum. `diff(x, x)` is always empty;
/// the caller still records an `updated` entry with an empty map to note
/// that an update happened.
pub fn diff(previous: &Contract, next: &Contract) -> BTreeMap<String, Value> {
    let mut changes = BTreeMap::new();

    if previous.title != next.title {
        changes.insert("title".to_string(), json!(next.title));
    }
    if previous.status != next.status {
        changes.insert("status".to_string(), json!(next.status.label()));
    }
    if previous.value != next.value {
        changes.insert("value".to_string(), json!(next.value));
    }

    changes
}

/// History entry for a freshly created contract.
pub fn created_entry(
    contract: &Contract,
    actor_id: Option<String>,
    recorded_at: DateTime<Utc>,
) -> ContractHistory {
    let mut changes = BTreeMap::new();
    changes.insert("title".to_string(), json!(contract.title));

    ContractHistory {
        contract_id: contract.id.clone(),
        actor_id,
        action: HistoryAction::Created,
        changes,
        recorded_at,
    }
}

/// History entry for an interactive update carrying the audit diff.
pub fn updated_entry(
    contract_id: ContractId,
    actor_id: Option<String>,
    changes: BTreeMap<String, Value>,
    recorded_at: DateTime<Utc>,
) -> ContractHistory {
    ContractHistory {
        contract_id,
        actor_id,
        action: HistoryAction::Updated,
        changes,
        recorded_at,
    }
}

/// History entry for an automatic rollover. System-originated: no actor.
pub fn renewed_entry(
    contract_id: ContractId,
    previous_end_date: NaiveDate,
    new_end_date: NaiveDate,
    renewed_on: NaiveDate,
    recorded_at: DateTime<Utc>,
) -> ContractHistory {
    let mut changes = BTreeMap::new();
    changes.insert("previous_end_date".to_string(), json!(previous_end_date));
    changes.insert("new_end_date".to_string(), json!(new_end_date));
    changes.insert("renewed_on".to_string(), json!(renewed_on));

    ContractHistory {
        contract_id,
        actor_id: None,
        action: HistoryAction::Renewed,
        changes,
        recorded_at,
    }
}

/// History entry for a deletion. The entry survives the contract.
pub fn deleted_entry(
    contract: &Contract,
    actor_id: Option<String>,
    recorded_at: DateTime<Utc>,
) -> ContractHistory {
    let mut changes = BTreeMap::new();
    changes.insert("title".to_string(), json!(contract.title));

    ContractHistory {
        contract_id: contract.id.clone(),
        actor_id,
        action: HistoryAction::Deleted,
        changes,
        recorded_at,
    }
}
