pub mod generator;
pub mod payment;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::types::{DayCountConvention, InstallmentStatus, LoanType};

pub use generator::generate;
pub use payment::{annuity_payment, discount_factor, level_payment, level_payment_continuous};

/// one installment of a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub installment_no: u32,
    pub due_date: NaiveDate,
    pub principal_due: Money,
    pub interest_due: Money,
    pub fees_due: Money,
    pub total_due: Money,
    pub principal_balance_after: Money,
    pub status: InstallmentStatus,
}

/// materialized schedule with summary totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub loan_type: LoanType,
    pub principal: Money,
    pub annual_rate: Percentage,
    pub term_months: u32,
    #[serde(default)]
    pub day_count_convention: DayCountConvention,
    pub fee_setup: Money,
    pub entries: Vec<ScheduleEntry>,
    pub total_interest: Money,
    /// recurring charges plus the setup fee
    pub total_fees: Money,
    /// every installment plus the setup fee
    pub total_payment: Money,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// get installment by its 1-based number
    pub fn entry(&self, installment_no: u32) -> Option<&ScheduleEntry> {
        installment_no
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx as usize))
    }

    pub fn first_payment(&self) -> Option<Money> {
        self.entries.first().map(|e| e.total_due)
    }

    pub fn last_payment(&self) -> Option<Money> {
        self.entries.last().map(|e| e.total_due)
    }

    /// sum of principal parts, equals the principal for any generated schedule
    pub fn total_principal(&self) -> Money {
        self.entries.iter().map(|e| e.principal_due).sum()
    }

    /// balance left after the given installment; 0 means before the first
    pub fn balance_after(&self, installment_no: u32) -> Money {
        if installment_no == 0 {
            return self.principal;
        }
        self.entry(installment_no)
            .map(|e| e.principal_balance_after)
            .unwrap_or(Money::ZERO)
    }

    pub fn maturity_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.due_date)
    }
}
