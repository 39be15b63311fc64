use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::errors::{CalcError, Result};
use crate::types::{DayCountConvention, LoanType, Unknown};

/// numeric settings shared by the inverse solvers and the effective rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// hard cap on root-finding iterations
    pub max_iterations: u32,
    /// relative tolerance on the payment (or NPV) residual
    pub relative_tolerance: Decimal,
    /// upper end of the rate search domain
    pub max_annual_rate: Percentage,
    /// upper end of the term search domain
    pub max_term_months: u32,
    /// how far a rounded term may overshoot the payment target
    pub rounding_tolerance: Money,
    /// upper end of the monthly IRR search domain
    pub irr_max_monthly_rate: Decimal,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            relative_tolerance: dec!(0.000001),
            max_annual_rate: Percentage::from_whole(100),
            max_term_months: 1200,
            rounding_tolerance: Money::CENT,
            irr_max_monthly_rate: Decimal::ONE,
        }
    }
}

impl SolverConfig {
    /// parse from json, missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SolverConfig = serde_json::from_str(json)
            .map_err(|e| CalcError::invalid_input(format!("solver config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(CalcError::invalid_input("max_iterations must be positive"));
        }
        if self.relative_tolerance <= Decimal::ZERO {
            return Err(CalcError::invalid_input("relative_tolerance must be positive"));
        }
        if self.max_annual_rate.as_decimal() <= Decimal::ZERO {
            return Err(CalcError::invalid_input("max_annual_rate must be positive"));
        }
        if self.max_term_months == 0 {
            return Err(CalcError::invalid_input("max_term_months must be positive"));
        }
        if self.rounding_tolerance.is_negative() {
            return Err(CalcError::invalid_input("rounding_tolerance must not be negative"));
        }
        if self.irr_max_monthly_rate <= Decimal::ZERO {
            return Err(CalcError::invalid_input("irr_max_monthly_rate must be positive"));
        }
        Ok(())
    }
}

/// loan input; the optional rate, term and pinned payment describe what is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub loan_type: LoanType,
    pub principal: Money,
    pub annual_rate: Option<Percentage>,
    pub term_months: Option<u32>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub day_count_convention: DayCountConvention,
    #[serde(default)]
    pub fee_setup: Money,
    #[serde(default)]
    pub fee_monthly: Money,
    #[serde(default)]
    pub insurance_monthly: Money,
    #[serde(default)]
    pub balloon_amount: Option<Money>,
    #[serde(default)]
    pub fixed_monthly_payment: Option<Money>,
    #[serde(default)]
    pub fixed_principal_payment: Option<Money>,
}

impl LoanTerms {
    pub fn builder() -> LoanTermsBuilder {
        LoanTermsBuilder::new()
    }

    /// fee and insurance added to every installment
    pub fn recurring_charges(&self) -> Money {
        self.fee_monthly + self.insurance_monthly
    }

    /// the payment override that applies to this loan type, if any
    pub fn pinned_payment(&self) -> Option<Money> {
        match self.loan_type {
            LoanType::FixedPrincipal => self.fixed_principal_payment,
            _ => self.fixed_monthly_payment,
        }
    }

    /// classify which primary parameter is left open
    pub fn unknown(&self) -> Result<Unknown> {
        let missing = [
            self.annual_rate.is_none(),
            self.term_months.is_none(),
            self.pinned_payment().is_none(),
        ];

        match missing {
            [false, false, false] => Ok(Unknown::Nothing),
            [true, false, false] => Ok(Unknown::Rate),
            [false, true, false] => Ok(Unknown::Term),
            [false, false, true] => Ok(Unknown::Payment),
            _ => Err(CalcError::invalid_input(
                "at most one of rate, term and payment may be unknown",
            )),
        }
    }

    /// copy with a concrete rate and term
    pub fn resolved(&self, annual_rate: Percentage, term_months: u32) -> LoanTerms {
        LoanTerms {
            annual_rate: Some(annual_rate),
            term_months: Some(term_months),
            ..self.clone()
        }
    }

    /// copy without the payment override
    pub fn without_pinned_payment(&self) -> LoanTerms {
        LoanTerms {
            fixed_monthly_payment: None,
            fixed_principal_payment: None,
            ..self.clone()
        }
    }

    /// sign and structure checks that hold whatever is being solved for
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(CalcError::invalid_input(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if let Some(rate) = self.annual_rate {
            if rate.is_negative() {
                return Err(CalcError::invalid_input(format!(
                    "annual rate must not be negative, got {}",
                    rate
                )));
            }
        }
        if self.term_months == Some(0) {
            return Err(CalcError::invalid_input("term must be at least one month"));
        }
        for (name, amount) in [
            ("setup fee", self.fee_setup),
            ("monthly fee", self.fee_monthly),
            ("monthly insurance", self.insurance_monthly),
        ] {
            if amount.is_negative() {
                return Err(CalcError::invalid_input(format!(
                    "{} must not be negative, got {}",
                    name, amount
                )));
            }
        }
        if self.fee_setup >= self.principal {
            return Err(CalcError::invalid_input("setup fee must be below the principal"));
        }
        if let Some(balloon) = self.balloon_amount {
            if balloon.is_negative() || balloon > self.principal {
                return Err(CalcError::invalid_input(format!(
                    "balloon {} must lie between zero and the principal",
                    balloon
                )));
            }
            if self.loan_type != LoanType::InterestOnly {
                return Err(CalcError::unsupported(format!(
                    "balloon amount is only meaningful for interest-only loans, not {}",
                    self.loan_type
                )));
            }
        }
        match self.loan_type {
            LoanType::FixedPrincipal if self.fixed_monthly_payment.is_some() => {
                return Err(CalcError::unsupported(
                    "fixed-principal loans pin the principal part, not the monthly payment",
                ));
            }
            LoanType::Annuity | LoanType::InterestOnly | LoanType::AutoLoan
                if self.fixed_principal_payment.is_some() =>
            {
                return Err(CalcError::unsupported(format!(
                    "a fixed principal part does not apply to {} loans",
                    self.loan_type
                )));
            }
            _ => {}
        }
        if let Some(pinned) = self.pinned_payment() {
            if !pinned.is_positive() {
                return Err(CalcError::invalid_input(format!(
                    "fixed payment must be positive, got {}",
                    pinned
                )));
            }
        }
        if self.loan_type == LoanType::InterestOnly
            && self.fixed_monthly_payment.is_some()
            && self.balloon_amount.is_some()
        {
            return Err(CalcError::invalid_input(
                "balloon and fixed payment both pin the final installment",
            ));
        }
        Ok(())
    }
}

/// builder for loan terms; the caller resolves what the user typed before calling the engine
#[derive(Debug, Clone, Default)]
pub struct LoanTermsBuilder {
    loan_type: Option<LoanType>,
    principal: Option<Money>,
    annual_rate: Option<Percentage>,
    term_months: Option<u32>,
    start_date: Option<NaiveDate>,
    fee_setup: Money,
    fee_monthly: Money,
    insurance_monthly: Money,
    balloon_amount: Option<Money>,
    fixed_monthly_payment: Option<Money>,
    fixed_principal_payment: Option<Money>,
}

impl LoanTermsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loan_type(mut self, loan_type: LoanType) -> Self {
        self.loan_type = Some(loan_type);
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn annual_rate(mut self, rate: Percentage) -> Self {
        self.annual_rate = Some(rate);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn fee_setup(mut self, fee: Money) -> Self {
        self.fee_setup = fee;
        self
    }

    pub fn fee_monthly(mut self, fee: Money) -> Self {
        self.fee_monthly = fee;
        self
    }

    pub fn insurance_monthly(mut self, insurance: Money) -> Self {
        self.insurance_monthly = insurance;
        self
    }

    pub fn balloon_amount(mut self, balloon: Money) -> Self {
        self.balloon_amount = Some(balloon);
        self
    }

    pub fn fixed_monthly_payment(mut self, payment: Money) -> Self {
        self.fixed_monthly_payment = Some(payment);
        self
    }

    pub fn fixed_principal_payment(mut self, payment: Money) -> Self {
        self.fixed_principal_payment = Some(payment);
        self
    }

    pub fn build(self) -> Result<LoanTerms> {
        let principal = self
            .principal
            .ok_or_else(|| CalcError::invalid_input("principal required"))?;

        let start_date = self
            .start_date
            .ok_or_else(|| CalcError::invalid_input("start date required"))?;

        let terms = LoanTerms {
            loan_type: self.loan_type.unwrap_or(LoanType::Annuity),
            principal,
            annual_rate: self.annual_rate,
            term_months: self.term_months,
            start_date,
            day_count_convention: DayCountConvention::Thirty360,
            fee_setup: self.fee_setup,
            fee_monthly: self.fee_monthly,
            insurance_monthly: self.insurance_monthly,
            balloon_amount: self.balloon_amount,
            fixed_monthly_payment: self.fixed_monthly_payment,
            fixed_principal_payment: self.fixed_principal_payment,
        };

        terms.validate()?;
        Ok(terms)
    }
}
