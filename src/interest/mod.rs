pub mod effective;

use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::Percentage;
use crate::errors::{CalcError, Result};

pub use effective::{cash_flows, effective_rate, irr_monthly, npv, EffectiveRate};

/// decimal places kept on reported annual rates (percent points)
pub const REPORTED_RATE_DP: u32 = 6;

/// compound a periodic rate over a year: ((1 + r)^n - 1) * 100
pub fn annualize(periodic_rate: Decimal, periods_per_year: u32) -> Result<Percentage> {
    let factor = (Decimal::ONE + periodic_rate)
        .checked_powu(periods_per_year as u64)
        .ok_or_else(|| CalcError::no_convergence("periodic rate too large to annualize"))?;
    let annual = (factor - Decimal::ONE) * Decimal::ONE_HUNDRED;
    Ok(Percentage::new(annual).round_dp(REPORTED_RATE_DP))
}

/// simple annual rate of a periodic rate: r * n * 100
pub fn nominal_annual(periodic_rate: Decimal, periods_per_year: u32) -> Percentage {
    let annual = periodic_rate * Decimal::from(periods_per_year) * Decimal::ONE_HUNDRED;
    Percentage::new(annual).round_dp(REPORTED_RATE_DP)
}
