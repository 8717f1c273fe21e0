use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{Contract, ContractHistory, ContractId, ContractStatus, ValidationError};
use super::history::renewed_entry;

/// Proposed rollover for one auto-renewing contract. The engine never
/// touches storage; the caller persists the new period and appends the
/// history entry atomically per contract.
#[derive(Debug, Clone, Serialize)]
pub struct RenewalInstruction {
    pub contract_id: ContractId,
    pub new_start: NaiveDate,
    pub new_end: NaiveDate,
    pub new_renewal_date: NaiveDate,
    pub history: ContractHistory,
}

/// A contract rejected during eligibility screening, surfaced instead of
/// aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct RenewalRejection {
    pub contract_id: ContractId,
    #[serde(serialize_with = "serialize_error")]
    pub error: ValidationError,
}

fn serialize_error<S>(error: &ValidationError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&error.to_string())
}

/// Outcome of one renewal sweep: instructions to apply plus the records
/// that failed validation.
#[derive(Debug, Default, Serialize)]
pub struct RenewalBatch {
    pub instructions: Vec<RenewalInstruction>,
    pub rejected: Vec<RenewalRejection>,
}

/// True when the contract should roll over on `today`: flagged for auto
/// renewal, not cancelled, and at or past its end date. Renewal triggers on
/// or after expiry, unlike the single-day reminder trigger.
pub fn is_due(contract: &Contract, today: NaiveDate) -> bool {
    contract.auto_renewal && contract.status != ContractStatus::Cancelled
        && today >= contract.end_date
}

/// Computes the next period for a due contract. The new period starts
/// exactly where the old one ended and preserves its duration in days.
pub fn roll_over(contract: &Contract, today: NaiveDate) -> Result<RenewalInstruction, ValidationError> {
    contract.validate()?;

    let duration = Duration::days(contract.period_days());
    let new_start = contract.end_date;
    let new_end = new_start + duration;

    let history = renewed_entry(
        contract.id.clone(),
        contract.end_date,
        new_end,
        today,
        Utc::now(),
    );

    Ok(RenewalInstruction {
        contract_id: contract.id.clone(),
        new_start,
        new_end,
        new_renewal_date: new_end,
        history,
    })
}

/// Screens a contract list for rollovers due on `today`. Invalid records
/// are collected as rejections; one bad contract never blocks the rest.
/// Idempotent: once a contract's end date has been advanced past `today`
/// by a prior run, it no longer qualifies.
pub fn renewals_due(contracts: &[Contract], today: NaiveDate) -> RenewalBatch {
    let mut batch = RenewalBatch::default();

    for contract in contracts {
        if !is_due(contract, today) {
            continue;
        }
        match roll_over(contract, today) {
            Ok(instruction) => batch.instructions.push(instruction),
            Err(error) => batch.rejected.push(RenewalRejection {
                contract_id: contract.id.clone(),
                error,
            }),
        }
    }

    batch
}
