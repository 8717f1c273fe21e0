use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::NotifierConfig;

use super::domain::{Contract, ContractDraft, ContractHistory, ContractId, ValidationError};
use super::history::{created_entry, deleted_entry, diff, updated_entry};
use super::notification::reminder;
use super::renewal::{renewals_due, RenewalRejection};
use super::repository::{ContractRepository, NotificationSender, RepositoryError, SendError};
use super::status::{classify, Clock, SystemClock};

/// Marker recorded in history when a reminder goes out, taken from the
/// original notification job; also used to de-duplicate re-runs of the
/// batch driver within the same day.
pub const NOTIFIED_MARKER: &str = "Notificação Enviada Automaticamente";

static CONTRACT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Ids combine the creation instant with a per-process counter so restarts
/// never reissue an id that an earlier process already persisted.
fn next_contract_id() -> (ContractId, String) {
    let seq = CONTRACT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let stamp = Utc::now().timestamp_millis() as u64;
    (
        ContractId(format!("ct-{stamp:011x}-{seq:04}")),
        format!("#CT-{}", 1000 + stamp.wrapping_add(seq) % 9000),
    )
}

/// Service composing the lifecycle rules with the repository and the
/// notification transport. Interactive CRUD paths and the scheduled batch
/// drivers share the same classifier so the two can never drift.
pub struct ContractService<R, S> {
    repository: Arc<R>,
    sender: Arc<S>,
    notifier: NotifierConfig,
    clock: Arc<dyn Clock>,
}

impl<R, S> ContractService<R, S>
where
    R: ContractRepository + 'static,
    S: NotificationSender + 'static,
{
    pub fn new(repository: Arc<R>, sender: Arc<S>, notifier: NotifierConfig) -> Self {
        Self::with_clock(repository, sender, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        sender: Arc<S>,
        notifier: NotifierConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            sender,
            notifier,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// All contracts with their lifecycle status derived from the dates.
    /// The stored status column is never trusted for display.
    pub fn list(&self) -> Result<Vec<Contract>, ContractServiceError> {
        let today = self.clock.today();
        let mut contracts = self.repository.list()?;
        for contract in &mut contracts {
            contract.status = classify(contract.end_date, contract.notification_days, today);
        }
        Ok(contracts)
    }

    pub fn get(&self, id: &ContractId) -> Result<Contract, ContractServiceError> {
        let mut contract = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        contract.status = classify(
            contract.end_date,
            contract.notification_days,
            self.clock.today(),
        );
        Ok(contract)
    }

    /// Creates a contract from a draft, assigning the id and `#CT-xxxx`
    /// reference, and appends the `created` audit entry.
    pub fn create(
        &self,
        draft: ContractDraft,
        actor_id: Option<String>,
    ) -> Result<Contract, ContractServiceError> {
        let (id, reference) = next_contract_id();
        let contract = Contract {
            id,
            reference,
            title: draft.title,
            vendor: draft.vendor,
            responsible_agent: draft.responsible_agent,
            value: draft.value,
            status: draft.status,
            start_date: draft.start_date,
            end_date: draft.end_date,
            renewal_date: draft.renewal_date,
            notification_days: draft
                .notification_days
                .unwrap_or(self.notifier.default_notification_days),
            auto_renewal: draft.auto_renewal,
            customer_email: draft.customer_email,
            customer_phone: draft.customer_phone,
            description: draft.description,
            custom_message: draft.custom_message,
        };
        contract.validate()?;

        let stored = self.repository.insert(contract)?;
        self.repository
            .append_history(created_entry(&stored, actor_id, Utc::now()))?;
        Ok(stored)
    }

    /// Replaces the editable fields of a contract and appends an `updated`
    /// audit entry carrying the field diff. The diff is computed against
    /// the record fetched here, in memory, so no second reference read can
    /// race the write. An empty diff is still recorded: the entry says an
    /// update happened even when nothing material changed.
    pub fn update(
        &self,
        id: &ContractId,
        draft: ContractDraft,
        actor_id: Option<String>,
    ) -> Result<Contract, ContractServiceError> {
        let previous = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        let next = Contract {
            id: previous.id.clone(),
            reference: previous.reference.clone(),
            title: draft.title,
            vendor: draft.vendor,
            responsible_agent: draft.responsible_agent,
            value: draft.value,
            status: draft.status,
            start_date: draft.start_date,
            end_date: draft.end_date,
            renewal_date: draft.renewal_date,
            notification_days: draft
                .notification_days
                .unwrap_or(self.notifier.default_notification_days),
            auto_renewal: draft.auto_renewal,
            customer_email: draft.customer_email,
            customer_phone: draft.customer_phone,
            description: draft.description,
            custom_message: draft.custom_message,
        };
        next.validate()?;

        let changes = diff(&previous, &next);
        self.repository.update(next.clone())?;
        self.repository
            .append_history(updated_entry(next.id.clone(), actor_id, changes, Utc::now()))?;
        Ok(next)
    }

    /// Removes the contract record. Its audit history is retained.
    pub fn delete(
        &self,
        id: &ContractId,
        actor_id: Option<String>,
    ) -> Result<(), ContractServiceError> {
        let contract = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        self.repository.delete(id)?;
        self.repository
            .append_history(deleted_entry(&contract, actor_id, Utc::now()))?;
        Ok(())
    }

    pub fn history(&self, id: &ContractId) -> Result<Vec<ContractHistory>, ContractServiceError> {
        Ok(self.repository.history_for(id)?)
    }

    /// Daily reminder sweep. Fires at most once per contract per trigger
    /// day: a same-day reminder already in the history short-circuits the
    /// send, so re-running the driver cannot double-notify. One failing
    /// contract never aborts the rest of the run.
    pub fn run_notifications(&self, today: Option<NaiveDate>) -> NotificationRunReport {
        let today = today.unwrap_or_else(|| self.clock.today());
        let mut report = NotificationRunReport {
            run_date: today,
            ..NotificationRunReport::default()
        };

        let contracts = match self.repository.list() {
            Ok(contracts) => contracts,
            Err(error) => {
                warn!(%error, "notification sweep could not list contracts");
                report.failures.push(BatchFailure {
                    contract_id: None,
                    error: error.to_string(),
                });
                return report;
            }
        };

        for contract in &contracts {
            let Some(notice) = reminder(contract, today) else {
                continue;
            };

            match self.reminder_already_sent(&notice.contract_id, today) {
                Ok(true) => {
                    info!(contract = %notice.contract_id, "reminder already sent today, skipping");
                    report.skipped.push(notice.contract_id);
                    continue;
                }
                Ok(false) => {}
                Err(error) => {
                    report.failures.push(BatchFailure {
                        contract_id: Some(notice.contract_id),
                        error: error.to_string(),
                    });
                    continue;
                }
            }

            if let Err(error) = self
                .sender
                .send(&notice.recipient, &notice.subject, &notice.body)
            {
                warn!(contract = %notice.contract_id, %error, "reminder send failed");
                report.failures.push(BatchFailure {
                    contract_id: Some(notice.contract_id),
                    error: error.to_string(),
                });
                continue;
            }

            let mut changes = std::collections::BTreeMap::new();
            changes.insert("status".to_string(), serde_json::json!(NOTIFIED_MARKER));
            changes.insert("notified_on".to_string(), serde_json::json!(today));
            let entry = updated_entry(notice.contract_id.clone(), None, changes, Utc::now());
            match self.repository.append_history(entry) {
                Ok(()) => {
                    info!(contract = %notice.contract_id, "expiry reminder sent");
                    report.sent.push(notice.contract_id);
                }
                Err(error) => {
                    report.failures.push(BatchFailure {
                        contract_id: Some(notice.contract_id),
                        error: error.to_string(),
                    });
                }
            }
        }

        report
    }

    /// A reminder entry carries the trigger day it was sent for, so re-runs
    /// are detected even when the driver is invoked with a date override.
    fn reminder_already_sent(
        &self,
        id: &ContractId,
        today: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let sent_marker = serde_json::json!(today);
        let history = self.repository.history_for(id)?;
        Ok(history.iter().any(|entry| {
            entry.changes.get("notified_on") == Some(&sent_marker)
                && entry
                    .changes
                    .get("status")
                    .and_then(|value| value.as_str())
                    .is_some_and(|marker| marker == NOTIFIED_MARKER)
        }))
    }

    /// Daily rollover sweep for auto-renewing contracts. For each due
    /// contract the repository persists the new period and the `renewed`
    /// audit entry; a persistence failure on one contract is reported and
    /// processing continues. Already-rolled contracts are naturally skipped
    /// because their end date now lies past `today`.
    pub fn run_renewals(&self, today: Option<NaiveDate>) -> RenewalRunReport {
        let today = today.unwrap_or_else(|| self.clock.today());
        let mut report = RenewalRunReport {
            run_date: today,
            ..RenewalRunReport::default()
        };

        let contracts = match self.repository.list() {
            Ok(contracts) => contracts,
            Err(error) => {
                warn!(%error, "renewal sweep could not list contracts");
                report.failures.push(BatchFailure {
                    contract_id: None,
                    error: error.to_string(),
                });
                return report;
            }
        };

        let batch = renewals_due(&contracts, today);
        report.rejected = batch.rejected;

        for instruction in batch.instructions {
            let applied = self
                .repository
                .save_renewal(
                    &instruction.contract_id,
                    instruction.new_start,
                    instruction.new_end,
                    instruction.new_renewal_date,
                )
                .and_then(|()| self.repository.append_history(instruction.history.clone()));

            match applied {
                Ok(()) => {
                    info!(
                        contract = %instruction.contract_id,
                        new_end = %instruction.new_end,
                        "contract renewed"
                    );
                    report.renewed.push(instruction.contract_id);
                }
                Err(error) => {
                    warn!(contract = %instruction.contract_id, %error, "renewal persist failed");
                    report.failures.push(BatchFailure {
                        contract_id: Some(instruction.contract_id),
                        error: error.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Per-contract failure surfaced by a batch run instead of aborting it.
/// `contract_id` is `None` when the whole listing failed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub contract_id: Option<ContractId>,
    pub error: String,
}

/// Outcome of one reminder sweep.
#[derive(Debug, Default, Serialize)]
pub struct NotificationRunReport {
    pub run_date: NaiveDate,
    pub sent: Vec<ContractId>,
    pub skipped: Vec<ContractId>,
    pub failures: Vec<BatchFailure>,
}

/// Outcome of one renewal sweep.
#[derive(Debug, Default, Serialize)]
pub struct RenewalRunReport {
    pub run_date: NaiveDate,
    pub renewed: Vec<ContractId>,
    pub rejected: Vec<RenewalRejection>,
    pub failures: Vec<BatchFailure>,
}

/// Error raised by the contract service.
#[derive(Debug, thiserror::Error)]
pub enum ContractServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Send(#[from] SendError),
}
