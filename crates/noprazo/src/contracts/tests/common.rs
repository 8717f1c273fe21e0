use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::config::NotifierConfig;
use crate::contracts::domain::{
    Contract, ContractDraft, ContractHistory, ContractId, ContractStatus,
};
use crate::contracts::repository::{
    ContractRepository, NotificationSender, RepositoryError, SendError,
};
use crate::contracts::service::ContractService;
use crate::contracts::status::FixedClock;

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// The reference contract from the lifecycle scenarios: a 30-day term in
/// January 2024 with a 7-day reminder window.
pub(super) fn january_contract(id: &str) -> Contract {
    Contract {
        id: ContractId(id.to_string()),
        reference: format!("#CT-{id}"),
        title: "Manutenção predial".to_string(),
        vendor: "Silva & Filhos Ltda".to_string(),
        responsible_agent: "Ana Ribeiro".to_string(),
        value: 4200.0,
        status: ContractStatus::Active,
        start_date: date(2024, 1, 1),
        end_date: date(2024, 1, 31),
        renewal_date: date(2024, 1, 31),
        notification_days: 7,
        auto_renewal: false,
        customer_email: Some("ana@example.com".to_string()),
        customer_phone: None,
        description: None,
        custom_message: None,
    }
}

pub(super) fn notifier_config() -> NotifierConfig {
    NotifierConfig {
        sender_address: "NoPrazo <contratos@noprazo.app>".to_string(),
        default_notification_days: 7,
    }
}

pub(super) fn draft_from(contract: &Contract) -> ContractDraft {
    ContractDraft {
        title: contract.title.clone(),
        vendor: contract.vendor.clone(),
        responsible_agent: contract.responsible_agent.clone(),
        value: contract.value,
        status: contract.status,
        start_date: contract.start_date,
        end_date: contract.end_date,
        renewal_date: contract.renewal_date,
        notification_days: Some(contract.notification_days),
        auto_renewal: contract.auto_renewal,
        customer_email: contract.customer_email.clone(),
        customer_phone: contract.customer_phone.clone(),
        description: contract.description.clone(),
        custom_message: contract.custom_message.clone(),
    }
}

pub(super) fn build_service(
    today: NaiveDate,
) -> (
    ContractService<MemoryRepository, MemorySender>,
    Arc<MemoryRepository>,
    Arc<MemorySender>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let sender = Arc::new(MemorySender::default());
    let service = ContractService::with_clock(
        repository.clone(),
        sender.clone(),
        notifier_config(),
        Arc::new(FixedClock(today)),
    );
    (service, repository, sender)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    pub(super) records: Mutex<HashMap<ContractId, Contract>>,
    pub(super) history: Mutex<Vec<ContractHistory>>,
}

impl MemoryRepository {
    pub(super) fn seed(&self, contract: Contract) {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(contract.id.clone(), contract);
    }

    pub(super) fn stored(&self, id: &ContractId) -> Option<Contract> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl ContractRepository for MemoryRepository {
    fn list(&self) -> Result<Vec<Contract>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut contracts: Vec<Contract> = guard.values().cloned().collect();
        contracts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(contracts)
    }

    fn fetch(&self, id: &ContractId) -> Result<Option<Contract>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert(&self, contract: Contract) -> Result<Contract, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&contract.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(contract.id.clone(), contract.clone());
        Ok(contract)
    }

    fn update(&self, contract: Contract) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&contract.id) {
            guard.insert(contract.id.clone(), contract);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn save_renewal(
        &self,
        id: &ContractId,
        new_start: NaiveDate,
        new_end: NaiveDate,
        new_renewal_date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let contract = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        contract.start_date = new_start;
        contract.end_date = new_end;
        contract.renewal_date = new_renewal_date;
        contract.status = ContractStatus::Active;
        Ok(())
    }

    fn delete(&self, id: &ContractId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).ok_or(RepositoryError::NotFound)?;
        Ok(())
    }

    fn append_history(&self, entry: ContractHistory) -> Result<(), RepositoryError> {
        self.history
            .lock()
            .expect("history mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn history_for(&self, id: &ContractId) -> Result<Vec<ContractHistory>, RepositoryError> {
        let guard = self.history.lock().expect("history mutex poisoned");
        let mut entries: Vec<ContractHistory> = guard
            .iter()
            .filter(|entry| &entry.contract_id == id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(entries)
    }
}

/// Repository stub whose every call fails, for continue-on-error tests.
pub(super) struct UnavailableRepository;

impl ContractRepository for UnavailableRepository {
    fn list(&self) -> Result<Vec<Contract>, RepositoryError> {
        Err(RepositoryError::Unavailable("listing offline".to_string()))
    }

    fn fetch(&self, _id: &ContractId) -> Result<Option<Contract>, RepositoryError> {
        Err(RepositoryError::Unavailable("fetch offline".to_string()))
    }

    fn insert(&self, _contract: Contract) -> Result<Contract, RepositoryError> {
        Err(RepositoryError::Unavailable("insert offline".to_string()))
    }

    fn update(&self, _contract: Contract) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("update offline".to_string()))
    }

    fn save_renewal(
        &self,
        _id: &ContractId,
        _new_start: NaiveDate,
        _new_end: NaiveDate,
        _new_renewal_date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("renewal offline".to_string()))
    }

    fn delete(&self, _id: &ContractId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("delete offline".to_string()))
    }

    fn append_history(&self, _entry: ContractHistory) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("history offline".to_string()))
    }

    fn history_for(&self, _id: &ContractId) -> Result<Vec<ContractHistory>, RepositoryError> {
        Err(RepositoryError::Unavailable("history offline".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SentMail {
    pub(super) to: String,
    pub(super) subject: String,
    pub(super) body: String,
}

#[derive(Default)]
pub(super) struct MemorySender {
    mail: Mutex<Vec<SentMail>>,
}

impl MemorySender {
    pub(super) fn sent(&self) -> Vec<SentMail> {
        self.mail.lock().expect("sender mutex poisoned").clone()
    }
}

impl NotificationSender for MemorySender {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError> {
        self.mail.lock().expect("sender mutex poisoned").push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Transport stub that always fails.
pub(super) struct FailingSender;

impl NotificationSender for FailingSender {
    fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), SendError> {
        Err(SendError::Transport("smtp relay refused".to_string()))
    }
}
