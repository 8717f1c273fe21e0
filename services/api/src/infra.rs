use chrono::{Duration, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use noprazo::contracts::{
    Contract, ContractHistory, ContractId, ContractRepository, ContractStatus, NotificationSender,
    RepositoryError, SendError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store used by the demo server and the one-shot batch
/// commands. A production deployment swaps this for a database-backed
/// implementation of the same trait.
#[derive(Default)]
pub(crate) struct InMemoryContractRepository {
    records: Mutex<HashMap<ContractId, Contract>>,
    history: Mutex<Vec<ContractHistory>>,
}

impl InMemoryContractRepository {
    pub(crate) fn seeded(today: NaiveDate) -> Self {
        let repository = Self::default();
        for contract in seed_contracts(today) {
            repository
                .records
                .lock()
                .expect("repository mutex poisoned")
                .insert(contract.id.clone(), contract);
        }
        repository
    }
}

impl ContractRepository for InMemoryContractRepository {
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

/// Stand-in for the real mail transport: logs and remembers each reminder.
pub(crate) struct RecordingSender {
    from_address: String,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    pub(crate) fn new(from_address: String) -> Self {
        Self {
            from_address,
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl NotificationSender for RecordingSender {
    fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), SendError> {
        info!(from = %self.from_address, %to, %subject, "reminder dispatched");
        self.sent
            .lock()
            .expect("sender mutex poisoned")
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Demo dataset: one contract mid-term, one inside its reminder window with
/// auto-renewal, and one already past its end date.
pub(crate) fn seed_contracts(today: NaiveDate) -> Vec<Contract> {
    let base = |id: &str, reference: &str| Contract {
        id: ContractId(id.to_string()),
        reference: reference.to_string(),
        title: String::new(),
        vendor: String::new(),
        responsible_agent: "Equipe de Contratos".to_string(),
        value: 0.0,
        status: ContractStatus::Active,
        start_date: today,
        end_date: today,
        renewal_date: today,
        notification_days: 7,
        auto_renewal: false,
        customer_email: None,
        customer_phone: None,
        description: None,
        custom_message: None,
    };

    let mut steady = base("ct-000101", "#CT-1101");
    steady.title = "Serviços de limpeza".to_string();
    steady.vendor = "Clean Pro Ltda".to_string();
    steady.value = 3500.0;
    steady.start_date = today - Duration::days(30);
    steady.end_date = today + Duration::days(150);
    steady.renewal_date = steady.end_date;

    let mut expiring = base("ct-000102", "#CT-1102");
    expiring.title = "Licença de software ERP".to_string();
    expiring.vendor = "SoftWorks".to_string();
    expiring.value = 18000.0;
    expiring.start_date = today - Duration::days(358);
    expiring.end_date = today + Duration::days(7);
    expiring.renewal_date = expiring.end_date;
    expiring.auto_renewal = true;
    expiring.customer_email = Some("ti@example.com".to_string());

    let mut lapsed = base("ct-000103", "#CT-1103");
    lapsed.title = "Manutenção de elevadores".to_string();
    lapsed.vendor = "Elevar Engenharia".to_string();
    lapsed.value = 9200.0;
    lapsed.start_date = today - Duration::days(95);
    lapsed.end_date = today - Duration::days(5);
    lapsed.renewal_date = lapsed.end_date;
    lapsed.auto_renewal = true;
    lapsed.customer_email = Some("predial@example.com".to_string());

    vec![steady, expiring, lapsed]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
