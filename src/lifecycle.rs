use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::calculator::LoanCalculationResult;
use crate::decimal::Money;
use crate::errors::{CalcError, Result};
use crate::events::{Event, EventStore};
use crate::schedule::ScheduleEntry;
use crate::types::{DisplayStatus, InstallmentStatus, LoanId};

/// status a reader sees on `today`; overdue is derived, never stored
pub fn derived_status(entry: &ScheduleEntry, today: NaiveDate) -> DisplayStatus {
    match entry.status {
        InstallmentStatus::Paid { .. } => DisplayStatus::Paid,
        InstallmentStatus::Pending if entry.due_date < today => DisplayStatus::Overdue,
        InstallmentStatus::Pending => DisplayStatus::Pending,
    }
}

/// same as `derived_status`, reading today from the clock
pub fn derived_status_with_time(entry: &ScheduleEntry, time_provider: &SafeTimeProvider) -> DisplayStatus {
    derived_status(entry, time_provider.now().date_naive())
}

/// days past the due date of an unpaid installment, zero otherwise
pub fn days_overdue(entry: &ScheduleEntry, today: NaiveDate) -> u32 {
    match derived_status(entry, today) {
        DisplayStatus::Overdue => (today - entry.due_date).num_days().max(0) as u32,
        _ => 0,
    }
}

/// recorded payment of one installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub installment_no: u32,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
}

/// snapshot of repayment progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub installments: u32,
    pub paid_count: u32,
    pub overdue_count: u32,
    pub overdue_amount: Money,
    pub total_paid: Money,
    pub outstanding_principal: Money,
    pub next_unpaid: Option<u32>,
    pub next_due_date: Option<NaiveDate>,
}

/// payments recorded against a generated schedule, keyed by installment number
///
/// The schedule entries are kept as generated; statuses are layered on top
/// when reading, so recording a payment never changes principal or interest.
#[derive(Debug)]
pub struct PaymentLedger {
    loan_id: LoanId,
    entries: Vec<ScheduleEntry>,
    payments: BTreeMap<u32, PaymentRecord>,
    events: EventStore,
}

impl PaymentLedger {
    pub fn new(loan_id: LoanId, entries: Vec<ScheduleEntry>) -> Self {
        Self {
            loan_id,
            entries,
            payments: BTreeMap::new(),
            events: EventStore::new(),
        }
    }

    /// open a ledger over a valid calculation result
    pub fn from_result(loan_id: LoanId, result: &LoanCalculationResult) -> Result<Self> {
        if !result.is_valid {
            return Err(CalcError::invalid_input(
                "cannot track payments against an invalid calculation",
            ));
        }
        Ok(Self::new(loan_id, result.schedule.clone()))
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    /// record the payment of an installment; repeating it returns the first record
    pub fn record_payment(&mut self, installment_no: u32, paid_at: DateTime<Utc>) -> Result<PaymentRecord> {
        let entry = self
            .entry(installment_no)
            .ok_or_else(|| {
                CalcError::invalid_input(format!(
                    "installment {} is not part of the schedule",
                    installment_no
                ))
            })?
            .clone();

        if let Some(existing) = self.payments.get(&installment_no).copied() {
            debug!(
                "installment {} of loan {} already paid at {}",
                installment_no, self.loan_id, existing.paid_at
            );
            self.events.emit(Event::DuplicatePaymentIgnored {
                loan_id: self.loan_id,
                installment_no,
                original_paid_at: existing.paid_at,
                attempted_at: paid_at,
            });
            return Ok(existing);
        }

        let record = PaymentRecord {
            installment_no,
            amount: entry.total_due,
            paid_at,
        };
        self.payments.insert(installment_no, record);

        self.events.emit(Event::InstallmentPaid {
            loan_id: self.loan_id,
            installment_no,
            due_date: entry.due_date,
            amount: record.amount,
            paid_at,
            late: paid_at.date_naive() > entry.due_date,
        });

        if self.is_repaid() {
            self.events.emit(Event::LoanRepaid {
                loan_id: self.loan_id,
                total_paid: self.total_paid(),
                timestamp: paid_at,
            });
        }

        Ok(record)
    }

    /// record a payment stamped with the provider's current time
    pub fn record_payment_now(
        &mut self,
        installment_no: u32,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentRecord> {
        self.record_payment(installment_no, time_provider.now())
    }

    pub fn entry(&self, installment_no: u32) -> Option<&ScheduleEntry> {
        installment_no
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx as usize))
    }

    pub fn payment(&self, installment_no: u32) -> Option<&PaymentRecord> {
        self.payments.get(&installment_no)
    }

    pub fn payments(&self) -> impl Iterator<Item = &PaymentRecord> {
        self.payments.values()
    }

    /// stored status of an installment
    pub fn status_of(&self, installment_no: u32) -> Option<InstallmentStatus> {
        self.entry(installment_no)?;
        Some(match self.payments.get(&installment_no) {
            Some(record) => InstallmentStatus::Paid {
                paid_at: record.paid_at,
            },
            None => InstallmentStatus::Pending,
        })
    }

    /// schedule entries with their stored status filled in from the ledger
    pub fn entries_with_status(&self) -> Vec<ScheduleEntry> {
        self.entries
            .iter()
            .map(|entry| ScheduleEntry {
                status: self.status_of(entry.installment_no).unwrap_or_default(),
                ..entry.clone()
            })
            .collect()
    }

    pub fn display_status(&self, installment_no: u32, today: NaiveDate) -> Option<DisplayStatus> {
        let entry = self.entry(installment_no)?;
        let status = self.status_of(installment_no)?;
        Some(derived_status(&ScheduleEntry { status, ..entry.clone() }, today))
    }

    pub fn paid_count(&self) -> u32 {
        self.payments.len() as u32
    }

    pub fn is_repaid(&self) -> bool {
        !self.entries.is_empty() && self.payments.len() == self.entries.len()
    }

    pub fn total_paid(&self) -> Money {
        self.payments.values().map(|p| p.amount).sum()
    }

    /// first installment without a recorded payment
    pub fn next_unpaid(&self) -> Option<&ScheduleEntry> {
        self.entries
            .iter()
            .find(|e| !self.payments.contains_key(&e.installment_no))
    }

    /// balance after the last installment of the unbroken paid run from the start
    pub fn outstanding_principal(&self) -> Money {
        let mut balance = self
            .entries
            .first()
            .map(|e| e.principal_balance_after + e.principal_due)
            .unwrap_or(Money::ZERO);
        for entry in &self.entries {
            if !self.payments.contains_key(&entry.installment_no) {
                break;
            }
            balance = entry.principal_balance_after;
        }
        balance
    }

    fn overdue(&self, today: NaiveDate) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries
            .iter()
            .filter(move |e| e.due_date < today && !self.payments.contains_key(&e.installment_no))
    }

    pub fn overdue_count(&self, today: NaiveDate) -> u32 {
        self.overdue(today).count() as u32
    }

    pub fn overdue_amount(&self, today: NaiveDate) -> Money {
        self.overdue(today).map(|e| e.total_due).sum()
    }

    pub fn summary(&self, today: NaiveDate) -> LedgerSummary {
        let next = self.next_unpaid();
        LedgerSummary {
            installments: self.entries.len() as u32,
            paid_count: self.paid_count(),
            overdue_count: self.overdue_count(today),
            overdue_amount: self.overdue_amount(today),
            total_paid: self.total_paid(),
            outstanding_principal: self.outstanding_principal(),
            next_unpaid: next.map(|e| e.installment_no),
            next_due_date: next.map(|e| e.due_date),
        }
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoanTerms, SolverConfig};
    use crate::decimal::Percentage;
    use crate::calculator::calculate;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn result() -> LoanCalculationResult {
        let terms = LoanTerms::builder()
            .principal(Money::from_major(1_200))
            .annual_rate(Percentage::ZERO)
            .term_months(4)
            .start_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
            .build()
            .unwrap();
        calculate(&terms, &SolverConfig::default())
    }

    fn ledger() -> PaymentLedger {
        PaymentLedger::from_result(Uuid::new_v4(), &result()).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_derived_status() {
        let result = result();
        let entry = &result.schedule[0];
        assert_eq!(entry.due_date, date(2024, 2, 15));

        assert_eq!(derived_status(entry, date(2024, 2, 1)), DisplayStatus::Pending);
        assert_eq!(derived_status(entry, date(2024, 2, 15)), DisplayStatus::Pending);
        assert_eq!(derived_status(entry, date(2024, 2, 16)), DisplayStatus::Overdue);
        assert_eq!(days_overdue(entry, date(2024, 2, 25)), 10);
        assert_eq!(days_overdue(entry, date(2024, 2, 10)), 0);

        let paid = ScheduleEntry {
            status: InstallmentStatus::Paid {
                paid_at: at(2024, 3, 1),
            },
            ..entry.clone()
        };
        assert_eq!(derived_status(&paid, date(2024, 6, 1)), DisplayStatus::Paid);
        assert_eq!(days_overdue(&paid, date(2024, 6, 1)), 0);
    }

    #[test]
    fn test_derived_status_follows_clock() {
        let time = SafeTimeProvider::new(TimeSource::Test(at(2024, 2, 10)));
        let control = time.test_control().unwrap();
        let result = result();
        let entry = &result.schedule[0];

        assert_eq!(derived_status_with_time(entry, &time), DisplayStatus::Pending);

        control.advance(Duration::days(10));
        assert_eq!(derived_status_with_time(entry, &time), DisplayStatus::Overdue);
    }

    #[test]
    fn test_record_payment() {
        let mut ledger = ledger();
        let record = ledger.record_payment(1, at(2024, 2, 14)).unwrap();

        assert_eq!(record.amount, Money::from_major(300));
        assert_eq!(ledger.paid_count(), 1);
        assert!(ledger.status_of(1).unwrap().is_paid());
        assert_eq!(ledger.status_of(2), Some(InstallmentStatus::Pending));
        assert_eq!(ledger.status_of(9), None);

        let events = ledger.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::InstallmentPaid { installment_no: 1, late: false, .. }));
    }

    #[test]
    fn test_record_payment_is_idempotent() {
        let mut ledger = ledger();
        let first = ledger.record_payment(2, at(2024, 3, 20)).unwrap();
        let again = ledger.record_payment(2, at(2024, 4, 2)).unwrap();

        assert_eq!(first, again);
        assert_eq!(ledger.paid_count(), 1);
        assert_eq!(ledger.total_paid(), Money::from_major(300));

        let events = ledger.take_events();
        assert!(matches!(events[0], Event::InstallmentPaid { late: true, .. }));
        assert!(matches!(events[1], Event::DuplicatePaymentIgnored { installment_no: 2, .. }));
    }

    #[test]
    fn test_unknown_installment() {
        let mut ledger = ledger();
        let err = ledger.record_payment(0, at(2024, 2, 1)).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidInput);
        assert!(ledger.record_payment(5, at(2024, 2, 1)).is_err());
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_payments_do_not_touch_amounts() {
        let result = result();
        let mut ledger = PaymentLedger::from_result(Uuid::new_v4(), &result).unwrap();
        ledger.record_payment(1, at(2024, 2, 15)).unwrap();

        let viewed = ledger.entries_with_status();
        for (before, after) in result.schedule.iter().zip(&viewed) {
            assert_eq!(before.principal_due, after.principal_due);
            assert_eq!(before.interest_due, after.interest_due);
            assert_eq!(before.total_due, after.total_due);
        }
        assert!(viewed[0].status.is_paid());
        assert!(!result.schedule[0].status.is_paid());
    }

    #[test]
    fn test_summary() {
        let mut ledger = ledger();
        ledger.record_payment(1, at(2024, 2, 15)).unwrap();
        ledger.record_payment(3, at(2024, 4, 15)).unwrap();

        let summary = ledger.summary(date(2024, 4, 20));
        assert_eq!(summary.installments, 4);
        assert_eq!(summary.paid_count, 2);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.overdue_amount, Money::from_major(300));
        assert_eq!(summary.next_unpaid, Some(2));
        assert_eq!(summary.next_due_date, Some(date(2024, 3, 15)));
        // installment 2 breaks the paid run, so only installment 1 counts
        assert_eq!(summary.outstanding_principal, Money::from_major(900));
        assert_eq!(ledger.display_status(2, date(2024, 4, 20)), Some(DisplayStatus::Overdue));
        assert_eq!(ledger.display_status(3, date(2024, 4, 20)), Some(DisplayStatus::Paid));
        assert_eq!(ledger.display_status(4, date(2024, 4, 20)), Some(DisplayStatus::Pending));
    }

    #[test]
    fn test_full_repayment() {
        let time = SafeTimeProvider::new(TimeSource::Test(at(2024, 2, 15)));
        let control = time.test_control().unwrap();
        let mut ledger = ledger();

        assert_eq!(ledger.outstanding_principal(), Money::from_major(1_200));
        for no in 1..=4 {
            ledger.record_payment_now(no, &time).unwrap();
            control.advance(Duration::days(30));
        }

        assert!(ledger.is_repaid());
        assert_eq!(ledger.outstanding_principal(), Money::ZERO);
        assert_eq!(ledger.next_unpaid(), None);
        assert_eq!(ledger.total_paid(), Money::from_decimal(dec!(1200)));
        assert!(ledger
            .events()
            .iter()
            .any(|e| matches!(e, Event::LoanRepaid { .. })));
    }

    #[test]
    fn test_invalid_result_has_no_ledger() {
        let invalid = LoanCalculationResult::invalid(&CalcError::invalid_input("bad"));
        assert!(PaymentLedger::from_result(Uuid::new_v4(), &invalid).is_err());
    }
}
