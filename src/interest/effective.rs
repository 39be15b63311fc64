use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::decimal::Percentage;
use crate::errors::{CalcError, Result};
use crate::interest::{annualize, nominal_annual};
use crate::schedule::Schedule;
use crate::solver::bisect;

/// cost of credit implied by a schedule and its setup fee
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveRate {
    /// monthly internal rate of return of the borrower's cash flows
    pub monthly_irr: Decimal,
    /// compounded annual rate, ((1 + r)^12 - 1) * 100 (APR / RPMN)
    pub effective_rate: Percentage,
    /// simple annual rate, r * 1200; matches the nominal rate when there are no fees
    pub nominal_equivalent_rate: Percentage,
}

/// borrower's cash flows: net disbursement at t=0, then every installment as an outflow
pub fn cash_flows(schedule: &Schedule) -> Vec<Decimal> {
    let mut flows = Vec::with_capacity(schedule.len() + 1);
    flows.push((schedule.principal - schedule.fee_setup).as_decimal());
    flows.extend(schedule.entries.iter().map(|e| -e.total_due.as_decimal()));
    flows
}

/// net present value at a monthly rate; flow t is discounted t months
pub fn npv(flows: &[Decimal], monthly_rate: Decimal) -> Result<Decimal> {
    let step = Decimal::ONE
        .checked_div(Decimal::ONE + monthly_rate)
        .ok_or_else(|| CalcError::no_convergence("discount rate out of range"))?;

    let mut discount = Decimal::ONE;
    let mut total = Decimal::ZERO;
    for flow in flows {
        total += flow * discount;
        discount *= step;
    }
    Ok(total)
}

/// monthly internal rate of return over [0, irr_max_monthly_rate]
pub fn irr_monthly(flows: &[Decimal], config: &SolverConfig) -> Result<Decimal> {
    let scale = flows
        .first()
        .map(|f| f.abs())
        .filter(|f| !f.is_zero())
        .ok_or_else(|| CalcError::no_convergence("no disbursement to discount against"))?;
    let tolerance = scale * config.relative_tolerance;

    bisect(
        "irr",
        Decimal::ZERO,
        config.irr_max_monthly_rate,
        tolerance,
        config,
        |rate| npv(flows, rate),
    )
}

/// effective annual rate of a finished schedule
pub fn effective_rate(schedule: &Schedule, config: &SolverConfig) -> Result<EffectiveRate> {
    if schedule.is_empty() {
        return Err(CalcError::no_convergence("schedule has no installments"));
    }

    let flows = cash_flows(schedule);
    let monthly_irr = irr_monthly(&flows, config)?;
    let periods = schedule.day_count_convention.periods_per_year();

    let rate = EffectiveRate {
        monthly_irr,
        effective_rate: annualize(monthly_irr, periods)?,
        nominal_equivalent_rate: nominal_annual(monthly_irr, periods),
    };

    debug!(
        "effective rate {} (nominal equivalent {}) for nominal {}",
        rate.effective_rate, rate.nominal_equivalent_rate, schedule.annual_rate
    );

    Ok(rate)
}
