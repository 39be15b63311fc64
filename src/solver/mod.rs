pub mod rate;
pub mod term;

use log::{trace, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{LoanTerms, SolverConfig};
use crate::decimal::Money;
use crate::errors::{CalcError, Result};
use crate::types::LoanType;

pub use rate::solve_rate_from_payment;
pub use term::solve_term_from_payment;

/// the known installment of a loan whose rate or term is being solved for
///
/// `payment` is the full installment the borrower sees; recurring fee and
/// insurance are stripped off before solving. For fixed-principal loans it is
/// the first installment, the largest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub loan_type: LoanType,
    pub principal: Money,
    pub payment: Money,
    #[serde(default)]
    pub fee_setup: Money,
    #[serde(default)]
    pub fee_monthly: Money,
    #[serde(default)]
    pub insurance_monthly: Money,
    /// interest-only final principal, defaults to the full principal
    #[serde(default)]
    pub balloon_amount: Option<Money>,
}

impl SolveRequest {
    pub fn new(loan_type: LoanType, principal: Money, payment: Money) -> Self {
        Self {
            loan_type,
            principal,
            payment,
            fee_setup: Money::ZERO,
            fee_monthly: Money::ZERO,
            insurance_monthly: Money::ZERO,
            balloon_amount: None,
        }
    }

    pub fn with_fees(mut self, fee_setup: Money, fee_monthly: Money, insurance_monthly: Money) -> Self {
        self.fee_setup = fee_setup;
        self.fee_monthly = fee_monthly;
        self.insurance_monthly = insurance_monthly;
        self
    }

    pub fn with_balloon(mut self, balloon: Money) -> Self {
        self.balloon_amount = Some(balloon);
        self
    }

    /// take the pinned monthly payment from loan terms
    pub fn from_terms(terms: &LoanTerms) -> Result<Self> {
        let payment = terms
            .fixed_monthly_payment
            .ok_or_else(|| CalcError::invalid_input("a fixed monthly payment is required to solve"))?;

        Ok(Self {
            loan_type: terms.loan_type,
            principal: terms.principal,
            payment,
            fee_setup: terms.fee_setup,
            fee_monthly: terms.fee_monthly,
            insurance_monthly: terms.insurance_monthly,
            balloon_amount: terms.balloon_amount,
        })
    }

    /// payment net of recurring charges
    pub fn amortizing_payment(&self) -> Money {
        self.payment - self.fee_monthly - self.insurance_monthly
    }

    /// principal left for the final installment of a level-payment loan
    pub fn balloon(&self) -> Money {
        match self.loan_type {
            LoanType::InterestOnly => self.balloon_amount.unwrap_or(self.principal),
            _ => Money::ZERO,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(CalcError::invalid_input(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if !self.payment.is_positive() {
            return Err(CalcError::invalid_input(format!(
                "payment must be positive, got {}",
                self.payment
            )));
        }
        if self.fee_setup.is_negative() || self.fee_monthly.is_negative() || self.insurance_monthly.is_negative() {
            return Err(CalcError::invalid_input("fees must not be negative"));
        }
        if let Some(balloon) = self.balloon_amount {
            if balloon.is_negative() || balloon > self.principal {
                return Err(CalcError::invalid_input(format!(
                    "balloon {} must lie between zero and the principal",
                    balloon
                )));
            }
        }
        Ok(())
    }
}

/// bracketed bisection for a monotonic residual
///
/// Returns the first midpoint whose residual is within `tolerance`, or the
/// bracket end whose residual already is. Fails when the residual has the same
/// sign at both ends or the iteration cap runs out.
pub(crate) fn bisect<F>(
    label: &str,
    mut lo: Decimal,
    mut hi: Decimal,
    tolerance: Decimal,
    config: &SolverConfig,
    residual: F,
) -> Result<Decimal>
where
    F: Fn(Decimal) -> Result<Decimal>,
{
    let f_lo = residual(lo)?;
    if f_lo.abs() <= tolerance {
        return Ok(lo);
    }
    let f_hi = residual(hi)?;
    if f_hi.abs() <= tolerance {
        return Ok(hi);
    }

    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        warn!(
            "{}: no sign change on [{}, {}] (residuals {}, {})",
            label, lo, hi, f_lo, f_hi
        );
        return Err(CalcError::no_convergence(format!(
            "{}: no root between {} and {}",
            label, lo, hi
        )));
    }

    let lo_negative = f_lo.is_sign_negative();

    for iteration in 0..config.max_iterations {
        let mid = (lo + hi) / Decimal::TWO;
        let f_mid = residual(mid)?;
        trace!("{}: iteration {} at {} residual {}", label, iteration, mid, f_mid);

        if f_mid.abs() <= tolerance {
            return Ok(mid);
        }

        if f_mid.is_sign_negative() == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    warn!(
        "{}: no convergence after {} iterations",
        label, config.max_iterations
    );
    Err(CalcError::no_convergence(format!(
        "{}: no convergence after {} iterations",
        label, config.max_iterations
    )))
}
