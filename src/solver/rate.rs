use log::debug;
use rust_decimal::Decimal;

use crate::config::SolverConfig;
use crate::decimal::{Money, Percentage};
use crate::errors::{CalcError, Result};
use crate::schedule::payment::level_payment;
use crate::solver::{bisect, SolveRequest};
use crate::types::LoanType;

/// decimal places kept on a solved rate (percent points)
const RATE_DP: u32 = 8;

/// find the annual rate at which `request.payment` is the installment over `term_months`
pub fn solve_rate_from_payment(
    request: &SolveRequest,
    term_months: u32,
    config: &SolverConfig,
) -> Result<Percentage> {
    request.validate()?;
    if term_months == 0 {
        return Err(CalcError::invalid_input("term must be at least one month"));
    }

    let amortizing = request.amortizing_payment();
    if !amortizing.is_positive() {
        return Err(CalcError::InfeasiblePayment {
            payment: amortizing,
            interest: Money::ZERO,
        });
    }

    debug!(
        "solving rate for {} loan: principal {}, payment {}, term {} months",
        request.loan_type, request.principal, request.payment, term_months
    );

    let rate = match request.loan_type {
        LoanType::FixedPrincipal => fixed_principal_rate(request, amortizing, term_months)?,
        LoanType::Annuity | LoanType::AutoLoan | LoanType::InterestOnly => {
            level_payment_rate(request, amortizing, term_months, config)?
        }
    };

    if rate > config.max_annual_rate {
        return Err(CalcError::no_convergence(format!(
            "solved rate {} exceeds the {} ceiling",
            rate, config.max_annual_rate
        )));
    }

    debug!("solved rate {}", rate);
    Ok(rate)
}

/// first installment = P/n + P*i, so the rate falls out directly
fn fixed_principal_rate(
    request: &SolveRequest,
    amortizing: Money,
    term_months: u32,
) -> Result<Percentage> {
    let part = Money::from_decimal_down(request.principal.as_decimal() / Decimal::from(term_months));
    let interest = amortizing - part;

    if interest.is_negative() {
        return Err(CalcError::no_convergence(format!(
            "payment {} is below the zero-rate installment {}",
            amortizing, part
        )));
    }

    let monthly = interest.as_decimal() / request.principal.as_decimal();
    Ok(Percentage::from_monthly_rate(monthly).round_dp(RATE_DP))
}

fn level_payment_rate(
    request: &SolveRequest,
    amortizing: Money,
    term_months: u32,
    config: &SolverConfig,
) -> Result<Percentage> {
    let principal = request.principal.as_decimal();
    let balloon = request.balloon().as_decimal();
    let target = amortizing.as_decimal();
    let tolerance = target * config.relative_tolerance;

    let points = bisect(
        "rate",
        Decimal::ZERO,
        config.max_annual_rate.as_decimal(),
        tolerance,
        config,
        |points| {
            let payment = level_payment(principal, points / Decimal::from(1200), term_months, balloon)?;
            Ok(payment - target)
        },
    )?;

    Ok(Percentage::new(points).round_dp(RATE_DP))
}
