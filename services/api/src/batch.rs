use crate::infra::{parse_date, InMemoryContractRepository, RecordingSender};
use chrono::{Local, NaiveDate};
use clap::Args;
use noprazo::config::AppConfig;
use noprazo::contracts::ContractService;
use noprazo::error::AppError;
use noprazo::telemetry;
use std::sync::Arc;

/// One-shot sweep arguments shared by `batch notify` and `batch renew`.
/// These commands replace the original's scheduled edge functions: a cron
/// entry invokes them once a day and consumes the JSON report.
#[derive(Args, Debug, Default)]
pub(crate) struct BatchArgs {
    /// Evaluation date for the sweep (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn demo_service(
    today: NaiveDate,
) -> Result<ContractService<InMemoryContractRepository, RecordingSender>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let repository = Arc::new(InMemoryContractRepository::seeded(today));
    let sender = Arc::new(RecordingSender::new(config.notifier.sender_address.clone()));
    Ok(ContractService::new(repository, sender, config.notifier))
}

pub(crate) fn run_notify(args: BatchArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let service = demo_service(today)?;

    let report = service.run_notifications(Some(today));
    let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_renew(args: BatchArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let service = demo_service(today)?;

    let report = service.run_renewals(Some(today));
    let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
