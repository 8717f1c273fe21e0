use chrono::{Duration, Local, NaiveDate};

use super::domain::ContractStatus;

/// The day a contract's expiry reminder is scheduled to fire:
/// `end_date - notification_days`.
pub fn alert_date(end_date: NaiveDate, notification_days: u32) -> NaiveDate {
    end_date - Duration::days(notification_days as i64)
}

/// Derives the lifecycle status of a contract from its end date and
/// reminder window, evaluated at `today`. Day-granular and pure: the same
/// inputs always produce the same status.
///
/// A zero-day window makes the alert date coincide with the end date, so
/// the contract reads `ExpiringSoon` only on its final day. A window longer
/// than the whole term reads `ExpiringSoon` from day one; both are intended.
pub fn classify(end_date: NaiveDate, notification_days: u32, today: NaiveDate) -> ContractStatus {
    if today > end_date {
        ContractStatus::Expired
    } else if today >= alert_date(end_date, notification_days) {
        ContractStatus::ExpiringSoon
    } else {
        ContractStatus::Active
    }
}

/// Source of "today" for the lifecycle rules. Production uses the local
/// calendar date; tests pin an arbitrary date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock calendar date in the server's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Deterministic clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
