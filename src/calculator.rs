use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{LoanTerms, SolverConfig};
use crate::decimal::{Money, Percentage};
use crate::errors::{CalcError, ErrorKind, Result};
use crate::interest::effective_rate;
use crate::schedule::{generate, Schedule, ScheduleEntry};
use crate::solver::term::fixed_principal_term;
use crate::solver::{solve_rate_from_payment, solve_term_from_payment, SolveRequest};
use crate::types::{LoanType, Unknown};

/// loan terms as handed to the calculator: two of rate, term and payment known
pub type LoanRequest = LoanTerms;

/// outcome of a full calculation; never mutated once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCalculationResult {
    pub is_valid: bool,
    pub error: Option<ErrorKind>,
    pub error_message: Option<String>,
    /// which primary parameter was derived
    pub solved: Option<Unknown>,
    pub loan_type: Option<LoanType>,
    pub resolved_rate: Option<Percentage>,
    pub resolved_term_months: Option<u32>,
    pub first_payment: Option<Money>,
    pub schedule: Vec<ScheduleEntry>,
    pub effective_rate: Option<Percentage>,
    pub nominal_equivalent_rate: Option<Percentage>,
    /// set when the schedule is fine but its effective rate could not be found
    pub effective_rate_error: Option<ErrorKind>,
    pub total_interest: Money,
    pub total_fees: Money,
    pub total_payment: Money,
}

impl LoanCalculationResult {
    /// result for inputs the engine cannot compute
    pub fn invalid(err: &CalcError) -> Self {
        Self {
            is_valid: false,
            error: Some(err.kind()),
            error_message: Some(err.to_string()),
            solved: None,
            loan_type: None,
            resolved_rate: None,
            resolved_term_months: None,
            first_payment: None,
            schedule: Vec::new(),
            effective_rate: None,
            nominal_equivalent_rate: None,
            effective_rate_error: None,
            total_interest: Money::ZERO,
            total_fees: Money::ZERO,
            total_payment: Money::ZERO,
        }
    }

    fn from_schedule(schedule: Schedule, solved: Unknown, config: &SolverConfig) -> Self {
        let (effective, effective_error) = match effective_rate(&schedule, config) {
            Ok(rate) => (Some(rate), None),
            Err(err) => {
                warn!("effective rate unavailable: {}", err);
                (None, Some(err.kind()))
            }
        };

        Self {
            is_valid: true,
            error: None,
            error_message: None,
            solved: Some(solved),
            loan_type: Some(schedule.loan_type),
            resolved_rate: Some(schedule.annual_rate),
            resolved_term_months: Some(schedule.term_months),
            first_payment: schedule.first_payment(),
            effective_rate: effective.map(|r| r.effective_rate),
            nominal_equivalent_rate: effective.map(|r| r.nominal_equivalent_rate),
            effective_rate_error: effective_error,
            total_interest: schedule.total_interest,
            total_fees: schedule.total_fees,
            total_payment: schedule.total_payment,
            schedule: schedule.entries,
        }
    }

    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    pub fn last_payment(&self) -> Option<Money> {
        self.schedule.last().map(|e| e.total_due)
    }
}

/// resolve the unknown, generate the schedule and price it; failures land in the result
pub fn calculate(terms: &LoanRequest, config: &SolverConfig) -> LoanCalculationResult {
    match try_calculate(terms, config) {
        Ok(result) => result,
        Err(err) => {
            debug!("calculation rejected: {}", err);
            LoanCalculationResult::invalid(&err)
        }
    }
}

pub fn try_calculate(terms: &LoanRequest, config: &SolverConfig) -> Result<LoanCalculationResult> {
    config.validate()?;
    terms.validate()?;

    let unknown = terms.unknown()?;
    debug!("calculating {} loan, unknown {:?}", terms.loan_type, unknown);

    let schedule = match unknown {
        Unknown::Nothing | Unknown::Payment => generate(terms)?,
        Unknown::Rate => {
            let term = required(terms.term_months, "term")?;
            let rate = solve_rate(terms, term, config)?;
            generate(&terms.resolved(rate, term).without_pinned_payment())?
        }
        Unknown::Term => {
            let rate = required(terms.annual_rate, "annual rate")?;
            match terms.loan_type {
                // the pinned principal part fixes the installment count directly
                LoanType::FixedPrincipal => {
                    let part = required(terms.fixed_principal_payment, "fixed principal payment")?;
                    let term = fixed_principal_term(terms.principal, part)?;
                    if term > config.max_term_months {
                        return Err(CalcError::no_convergence(format!(
                            "term of {} months exceeds the {} month ceiling",
                            term, config.max_term_months
                        )));
                    }
                    generate(&terms.resolved(rate, term))?
                }
                _ => {
                    let request = SolveRequest::from_terms(terms)?;
                    let term = solve_term_from_payment(&request, rate, config)?;
                    generate(&terms.resolved(rate, term).without_pinned_payment())?
                }
            }
        }
    };

    Ok(LoanCalculationResult::from_schedule(schedule, unknown, config))
}

fn solve_rate(terms: &LoanTerms, term: u32, config: &SolverConfig) -> Result<Percentage> {
    if terms.loan_type == LoanType::FixedPrincipal {
        return Err(CalcError::unsupported(
            "a fixed principal part carries no information about the rate",
        ));
    }
    let request = SolveRequest::from_terms(terms)?;
    solve_rate_from_payment(&request, term, config)
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| CalcError::invalid_input(format!("{} must be known", name)))
}
