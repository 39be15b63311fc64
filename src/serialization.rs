/// persistence rows for loans and their schedules
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculator::LoanCalculationResult;
use crate::config::LoanTerms;
use crate::decimal::{Money, Percentage};
use crate::errors::{CalcError, Result};
use crate::lifecycle::PaymentLedger;
use crate::schedule::ScheduleEntry;
use crate::types::{DayCountConvention, InstallmentStatus, LoanId, LoanStatus, LoanType, RateType};

/// one row per loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRow {
    pub id: LoanId,
    pub lender: String,
    pub loan_type: LoanType,
    pub principal: Money,
    pub annual_rate: Percentage,
    pub rate_type: RateType,
    pub day_count_convention: DayCountConvention,
    pub start_date: NaiveDate,
    pub term_months: u32,
    pub fee_setup: Money,
    pub fee_monthly: Money,
    pub insurance_monthly: Money,
    pub balloon_amount: Option<Money>,
    pub status: LoanStatus,
}

impl LoanRow {
    /// row for a calculated loan; rate and term come from the result so solved values are stored
    pub fn from_calculation(
        lender: impl Into<String>,
        rate_type: RateType,
        terms: &LoanTerms,
        result: &LoanCalculationResult,
    ) -> Result<Self> {
        let (annual_rate, term_months) = match (result.is_valid, result.resolved_rate, result.resolved_term_months) {
            (true, Some(rate), Some(term)) => (rate, term),
            _ => {
                return Err(CalcError::invalid_input(
                    "only a valid calculation can be persisted",
                ))
            }
        };

        Ok(LoanRow {
            id: Uuid::new_v4(),
            lender: lender.into(),
            loan_type: terms.loan_type,
            principal: terms.principal,
            annual_rate,
            rate_type,
            day_count_convention: terms.day_count_convention,
            start_date: terms.start_date,
            term_months,
            fee_setup: terms.fee_setup,
            fee_monthly: terms.fee_monthly,
            insurance_monthly: terms.insurance_monthly,
            balloon_amount: terms.balloon_amount,
            status: LoanStatus::Active,
        })
    }

    /// paid off once the ledger holds a payment for every installment
    pub fn sync_status(&mut self, ledger: &PaymentLedger) -> Result<LoanStatus> {
        if ledger.loan_id() != self.id {
            return Err(CalcError::invalid_input(format!(
                "ledger of loan {} does not belong to loan {}",
                ledger.loan_id(),
                self.id
            )));
        }
        self.status = if ledger.is_repaid() {
            LoanStatus::PaidOff
        } else {
            LoanStatus::Active
        };
        Ok(self.status)
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// one row per installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub loan_id: LoanId,
    pub installment_no: u32,
    pub due_date: NaiveDate,
    pub principal_due: Money,
    pub interest_due: Money,
    pub fees_due: Money,
    pub total_due: Money,
    pub principal_balance_after: Money,
    /// `pending` or `paid`; overdue is derived on read
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
}

impl ScheduleRow {
    pub fn from_entry(loan_id: LoanId, entry: &ScheduleEntry) -> Self {
        let paid_at = match entry.status {
            InstallmentStatus::Paid { paid_at } => Some(paid_at),
            InstallmentStatus::Pending => None,
        };

        ScheduleRow {
            loan_id,
            installment_no: entry.installment_no,
            due_date: entry.due_date,
            principal_due: entry.principal_due,
            interest_due: entry.interest_due,
            fees_due: entry.fees_due,
            total_due: entry.total_due,
            principal_balance_after: entry.principal_balance_after,
            status: entry.status.as_str().to_string(),
            paid_at,
        }
    }

    pub fn from_schedule(loan_id: LoanId, entries: &[ScheduleEntry]) -> Vec<Self> {
        entries.iter().map(|e| Self::from_entry(loan_id, e)).collect()
    }

    /// rebuild the entry a row was stored from
    pub fn to_entry(&self) -> Result<ScheduleEntry> {
        let status = match (self.status.as_str(), self.paid_at) {
            ("pending", None) => InstallmentStatus::Pending,
            ("paid", Some(paid_at)) => InstallmentStatus::Paid { paid_at },
            (other, _) => {
                return Err(CalcError::invalid_input(format!(
                    "installment {} has inconsistent status {:?}",
                    self.installment_no, other
                )))
            }
        };

        Ok(ScheduleEntry {
            installment_no: self.installment_no,
            due_date: self.due_date,
            principal_due: self.principal_due,
            interest_due: self.interest_due,
            fees_due: self.fees_due,
            total_due: self.total_due,
            principal_balance_after: self.principal_balance_after,
            status,
        })
    }
}

/// rows of a schedule as pretty-printed json
pub fn to_json_pretty(rows: &[ScheduleRow]) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}
