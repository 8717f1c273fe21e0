use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Contract, ContractId};
use super::status::alert_date;

/// Reminder body used when a contract carries no custom message.
pub const DEFAULT_TEMPLATE: &str = "Olá,

Este é um lembrete automático para informar que o contrato **{NOME_DO_CONTRATO}** está próximo do seu vencimento.

**Detalhes do contrato:**

* Responsável: {RESPONSAVEL}
* Data de início: {DATA_INICIO}
* Data de término: {DATA_FIM}

⚠️ **Atenção:**
O contrato vence em **{DIAS_RESTANTES} dias**. Recomendamos que as providências necessárias sejam avaliadas com antecedência, seja para renovação, encerramento ou ajustes contratuais.

Caso este contrato já tenha sido renovado ou encerrado, por favor, desconsidere esta mensagem.

Este é um e-mail automático enviado pelo sistema de controle de contratos.

Atenciosamente,

Controle inteligente de contratos";

/// Placeholder shown when the responsible party was never filled in; a
/// missing optional field must not block a required reminder.
const MISSING_RESPONSIBLE: &str = "Não informado";

const DATE_FORMAT: &str = "%d/%m/%Y";

/// True iff `today` is exactly the alert date. The reminder has a single
/// trigger day per contract period; renewal is "on or after" instead.
pub fn should_notify(end_date: NaiveDate, notification_days: u32, today: NaiveDate) -> bool {
    alert_date(end_date, notification_days) == today
}

/// Substitutes the reminder placeholders into `template`. Every placeholder
/// may appear any number of times; unknown placeholders are left verbatim.
pub fn render_message(template: &str, contract: &Contract) -> String {
    let responsible = if contract.responsible_agent.trim().is_empty() {
        MISSING_RESPONSIBLE
    } else {
        contract.responsible_agent.as_str()
    };

    template
        .replace("{NOME_DO_CONTRATO}", &contract.title)
        .replace("{RESPONSAVEL}", responsible)
        .replace(
            "{DATA_INICIO}",
            &contract.start_date.format(DATE_FORMAT).to_string(),
        )
        .replace(
            "{DATA_FIM}",
            &contract.end_date.format(DATE_FORMAT).to_string(),
        )
        .replace("{DIAS_RESTANTES}", &contract.notification_days.to_string())
}

/// A rendered reminder ready for the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderNotice {
    pub contract_id: ContractId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Builds the reminder for `contract` if today is its trigger day and a
/// customer e-mail is on file. Plain text with literal newlines; any
/// HTML escaping belongs to the transport.
pub fn reminder(contract: &Contract, today: NaiveDate) -> Option<ReminderNotice> {
    let recipient = contract.customer_email.as_deref()?.trim();
    if recipient.is_empty() {
        return None;
    }
    if !should_notify(contract.end_date, contract.notification_days, today) {
        return None;
    }

    let template = contract
        .custom_message
        .as_deref()
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(DEFAULT_TEMPLATE);

    Some(ReminderNotice {
        contract_id: contract.id.clone(),
        recipient: recipient.to_string(),
        subject: format!("Lembrete de Vencimento: {}", contract.title),
        body: render_message(template, contract),
    })
}

/// Reminders due across a full contract list on `today`.
pub fn reminders_due(contracts: &[Contract], today: NaiveDate) -> Vec<ReminderNotice> {
    contracts
        .iter()
        .filter_map(|contract| reminder(contract, today))
        .collect()
}
