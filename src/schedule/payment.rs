use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::{Money, Percentage};
use crate::errors::{CalcError, Result};

/// present value of one unit due after `periods` months, (1 + i)^-n
pub fn discount_factor(monthly_rate: Decimal, periods: u32) -> Result<Decimal> {
    let v = per_period_discount(monthly_rate)?;
    v.checked_powu(periods as u64)
        .ok_or_else(|| CalcError::invalid_input("discount factor out of range"))
}

/// (1 + i)^-n for a fractional number of periods
pub fn discount_factor_continuous(monthly_rate: Decimal, periods: Decimal) -> Result<Decimal> {
    if monthly_rate.is_zero() || periods.is_zero() {
        return Ok(Decimal::ONE);
    }
    let v = per_period_discount(monthly_rate)?;
    let exponent = periods * v.ln();

    // a very negative exponent underflows to zero rather than failing
    Ok(exponent.checked_exp().unwrap_or(Decimal::ZERO))
}

fn per_period_discount(monthly_rate: Decimal) -> Result<Decimal> {
    if monthly_rate.is_sign_negative() && !monthly_rate.is_zero() {
        return Err(CalcError::invalid_input(format!(
            "periodic rate must not be negative, got {}",
            monthly_rate
        )));
    }
    Decimal::ONE
        .checked_div(Decimal::ONE + monthly_rate)
        .ok_or_else(|| CalcError::invalid_input("periodic rate out of range"))
}

/// level payment that takes `principal` down to `balloon` over `periods` months
///
/// PMT = (P - B * v^n) * i / (1 - v^n), or (P - B) / n when i = 0.
/// The result is unrounded; the schedule rounds it to cents once.
pub fn level_payment(
    principal: Decimal,
    monthly_rate: Decimal,
    periods: u32,
    balloon: Decimal,
) -> Result<Decimal> {
    if periods == 0 {
        return Err(CalcError::invalid_input("term must be at least one month"));
    }
    let v_n = discount_factor(monthly_rate, periods)?;
    level_payment_from_factor(principal, monthly_rate, Decimal::from(periods), balloon, v_n)
}

/// level payment for a fractional term, used by the term solver
pub fn level_payment_continuous(
    principal: Decimal,
    monthly_rate: Decimal,
    periods: Decimal,
    balloon: Decimal,
) -> Result<Decimal> {
    if periods <= Decimal::ZERO {
        return Err(CalcError::invalid_input("term must be positive"));
    }
    let v_n = discount_factor_continuous(monthly_rate, periods)?;
    level_payment_from_factor(principal, monthly_rate, periods, balloon, v_n)
}

fn level_payment_from_factor(
    principal: Decimal,
    monthly_rate: Decimal,
    periods: Decimal,
    balloon: Decimal,
    v_n: Decimal,
) -> Result<Decimal> {
    let denominator = Decimal::ONE - v_n;

    if monthly_rate.is_zero() || denominator.is_zero() {
        return (principal - balloon)
            .checked_div(periods)
            .ok_or_else(|| CalcError::invalid_input("term out of range"));
    }

    let numerator = (principal - balloon * v_n) * monthly_rate;
    numerator
        .checked_div(denominator)
        .ok_or_else(|| CalcError::invalid_input("level payment out of range"))
}

/// standard annuity installment rounded to cents
pub fn annuity_payment(principal: Money, annual_rate: Percentage, term_months: u32) -> Result<Money> {
    let payment = level_payment(
        principal.as_decimal(),
        annual_rate.monthly_rate(),
        term_months,
        Decimal::ZERO,
    )?;
    Ok(Money::from_decimal(payment))
}
