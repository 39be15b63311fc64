use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::SolverConfig;
use crate::decimal::{Money, Percentage};
use crate::errors::{CalcError, Result};
use crate::schedule::payment::{level_payment, level_payment_continuous};
use crate::solver::{bisect, SolveRequest};
use crate::types::LoanType;

/// find the number of months over which `request.payment` repays the principal at `annual_rate`
pub fn solve_term_from_payment(
    request: &SolveRequest,
    annual_rate: Percentage,
    config: &SolverConfig,
) -> Result<u32> {
    request.validate()?;
    if annual_rate.is_negative() {
        return Err(CalcError::invalid_input(format!(
            "annual rate must not be negative, got {}",
            annual_rate
        )));
    }

    let monthly_rate = annual_rate.monthly_rate();
    let amortizing = request.amortizing_payment();
    let first_interest = request.principal.interest_at(monthly_rate);

    if amortizing <= first_interest {
        return Err(CalcError::InfeasiblePayment {
            payment: amortizing,
            interest: first_interest,
        });
    }

    debug!(
        "solving term for {} loan: principal {}, rate {}, payment {}",
        request.loan_type, request.principal, annual_rate, request.payment
    );

    let term = match request.loan_type {
        LoanType::InterestOnly => {
            return Err(CalcError::unsupported(
                "an interest-only payment does not determine the term",
            ));
        }
        LoanType::FixedPrincipal => fixed_principal_term(request.principal, amortizing - first_interest)?,
        LoanType::Annuity | LoanType::AutoLoan => {
            level_payment_term(request.principal, monthly_rate, amortizing, config)?
        }
    };

    if term > config.max_term_months {
        return Err(CalcError::no_convergence(format!(
            "term of {} months exceeds the {} month ceiling",
            term, config.max_term_months
        )));
    }

    debug!("solved term {} months", term);
    Ok(term)
}

/// months needed when every installment repays `part` of principal
pub fn fixed_principal_term(principal: Money, part: Money) -> Result<u32> {
    if !part.is_positive() {
        return Err(CalcError::invalid_input(format!(
            "principal part must be positive, got {}",
            part
        )));
    }
    let months = (principal.as_decimal() / part.as_decimal()).ceil();
    to_months(months)
}

fn level_payment_term(
    principal: Money,
    monthly_rate: Decimal,
    amortizing: Money,
    config: &SolverConfig,
) -> Result<u32> {
    let p = principal.as_decimal();
    let target = amortizing.as_decimal();

    // a payment covering a one-month loan outright needs a single installment
    if level_payment(p, monthly_rate, 1, Decimal::ZERO)? <= target {
        return Ok(1);
    }

    let tolerance = target * config.relative_tolerance;
    let continuous = bisect(
        "term",
        Decimal::ONE,
        Decimal::from(config.max_term_months),
        tolerance,
        config,
        |months| Ok(level_payment_continuous(p, monthly_rate, months, Decimal::ZERO)? - target),
    )?;

    round_term(p, monthly_rate, continuous, amortizing, config.rounding_tolerance)
}

/// take the month below the continuous root unless its installment overshoots the target
fn round_term(
    principal: Decimal,
    monthly_rate: Decimal,
    continuous: Decimal,
    target: Money,
    rounding_tolerance: Money,
) -> Result<u32> {
    let below = to_months(continuous.floor().max(Decimal::ONE))?;
    let required = Money::from_decimal(level_payment(principal, monthly_rate, below, Decimal::ZERO)?);

    if required <= target + rounding_tolerance {
        Ok(below)
    } else {
        Ok(below + 1)
    }
}

fn to_months(months: Decimal) -> Result<u32> {
    months
        .to_u32()
        .filter(|m| *m >= 1)
        .ok_or_else(|| CalcError::no_convergence(format!("term {} out of range", months)))
}
