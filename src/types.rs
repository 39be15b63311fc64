use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// identifier of a persisted loan
pub type LoanId = Uuid;

/// loan structures the schedule generator understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    /// level total payment, interest/principal mix shifts over time
    Annuity,
    /// level principal repayment, total payment declines over time
    FixedPrincipal,
    /// interest only, principal (or a stated balloon) due at term end
    InterestOnly,
    /// vehicle financing, amortized like an annuity
    AutoLoan,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Annuity => "annuity",
            LoanType::FixedPrincipal => "fixed_principal",
            LoanType::InterestOnly => "interest_only",
            LoanType::AutoLoan => "auto_loan",
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// how the lender sets the rate (stored with the loan, not used by the engine)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    #[default]
    Fixed,
    Variable,
}

/// day count convention; installments are exactly one calendar month apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCountConvention {
    /// 30 days per month / 360 days per year
    #[default]
    #[serde(rename = "30E/360")]
    Thirty360,
}

impl DayCountConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayCountConvention::Thirty360 => "30E/360",
        }
    }

    /// periods per year
    pub fn periods_per_year(&self) -> u32 {
        match self {
            DayCountConvention::Thirty360 => 12,
        }
    }
}

/// status column of a persisted loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Active,
    PaidOff,
}

/// stored status of a schedule entry; overdue is never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstallmentStatus {
    #[default]
    Pending,
    Paid { paid_at: DateTime<Utc> },
}

impl InstallmentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, InstallmentStatus::Paid { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid { .. } => "paid",
        }
    }
}

/// status as shown to a reader at a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Pending,
    Overdue,
    Paid,
}

/// which primary parameter a request leaves open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unknown {
    /// rate, term and payment are all known
    Nothing,
    Rate,
    Term,
    Payment,
}
