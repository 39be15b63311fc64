use chrono::{Months, NaiveDate};
use log::debug;
use rust_decimal::Decimal;

use crate::config::LoanTerms;
use crate::decimal::{Money, Percentage};
use crate::errors::{CalcError, Result};
use crate::schedule::payment::level_payment;
use crate::schedule::{Schedule, ScheduleEntry};
use crate::types::{InstallmentStatus, LoanType};

/// how the principal is paid down between the first and the final installment
#[derive(Debug, Clone, Copy, PartialEq)]
enum Amortization {
    /// level amortizing payment (interest + principal), recurring charges excluded
    Level {
        payment: Money,
        allow_zero_principal: bool,
    },
    /// constant principal part, interest on the declining balance
    ConstantPrincipal { part: Money },
}

/// generate the installment schedule; rate and term must already be resolved
pub fn generate(terms: &LoanTerms) -> Result<Schedule> {
    terms.validate()?;

    let annual_rate = terms
        .annual_rate
        .ok_or_else(|| CalcError::invalid_input("annual rate must be resolved before generating"))?;
    let term_months = terms
        .term_months
        .ok_or_else(|| CalcError::invalid_input("term must be resolved before generating"))?;

    debug!(
        "generating {} schedule: principal {}, rate {}, term {} months",
        terms.loan_type, terms.principal, annual_rate, term_months
    );

    let monthly_rate = annual_rate.monthly_rate();
    let amortization = plan(terms, monthly_rate, term_months)?;
    let entries = build_entries(terms, monthly_rate, term_months, amortization)?;

    let total_interest: Money = entries.iter().map(|e| e.interest_due).sum();
    let recurring: Money = entries.iter().map(|e| e.fees_due).sum();
    let installments: Money = entries.iter().map(|e| e.total_due).sum();

    let schedule = Schedule {
        loan_type: terms.loan_type,
        principal: terms.principal,
        annual_rate,
        term_months,
        day_count_convention: terms.day_count_convention,
        fee_setup: terms.fee_setup,
        entries,
        total_interest,
        total_fees: recurring + terms.fee_setup,
        total_payment: installments + terms.fee_setup,
    };

    debug!(
        "generated {} installments, total interest {}, total payment {}",
        schedule.len(),
        schedule.total_interest,
        schedule.total_payment
    );

    Ok(schedule)
}

/// pick the amortization shape for the loan type and check the pinned payment
fn plan(terms: &LoanTerms, monthly_rate: Decimal, term_months: u32) -> Result<Amortization> {
    let principal = terms.principal;
    let first_interest = principal.interest_at(monthly_rate);
    let charges = terms.recurring_charges();

    match terms.loan_type {
        LoanType::Annuity | LoanType::AutoLoan => {
            let payment = match terms.fixed_monthly_payment {
                Some(pinned) => {
                    let amortizing = pinned - charges;
                    if amortizing <= first_interest {
                        return Err(CalcError::InfeasiblePayment {
                            payment: amortizing,
                            interest: first_interest,
                        });
                    }
                    amortizing
                }
                // truncated so that the first n - 1 installments never overpay
                None => Money::from_decimal_down(level_payment(
                    principal.as_decimal(),
                    monthly_rate,
                    term_months,
                    Decimal::ZERO,
                )?),
            };
            Ok(Amortization::Level {
                payment,
                allow_zero_principal: false,
            })
        }
        LoanType::InterestOnly => {
            let payment = match terms.fixed_monthly_payment {
                Some(pinned) => {
                    let amortizing = pinned - charges;
                    if amortizing < first_interest {
                        return Err(CalcError::InfeasiblePayment {
                            payment: amortizing,
                            interest: first_interest,
                        });
                    }
                    amortizing
                }
                None => {
                    let balloon = terms.balloon_amount.unwrap_or(principal);
                    let level = Money::from_decimal_down(level_payment(
                        principal.as_decimal(),
                        monthly_rate,
                        term_months,
                        balloon.as_decimal(),
                    )?);
                    // never below the rounded interest the first installment charges
                    level.max(first_interest)
                }
            };
            Ok(Amortization::Level {
                payment,
                allow_zero_principal: true,
            })
        }
        LoanType::FixedPrincipal => {
            let part = match terms.fixed_principal_payment {
                Some(pinned) => pinned,
                None => Money::from_decimal_down(principal.as_decimal() / Decimal::from(term_months)),
            };
            if !part.is_positive() && term_months > 1 {
                return Err(CalcError::invalid_input(format!(
                    "principal {} is too small to split over {} months",
                    principal, term_months
                )));
            }
            Ok(Amortization::ConstantPrincipal { part })
        }
    }
}

fn build_entries(
    terms: &LoanTerms,
    monthly_rate: Decimal,
    term_months: u32,
    amortization: Amortization,
) -> Result<Vec<ScheduleEntry>> {
    let fees_due = terms.recurring_charges();
    let mut entries = Vec::with_capacity(term_months as usize);
    let mut balance = terms.principal;

    for installment_no in 1..=term_months {
        let due_date = due_date(terms.start_date, installment_no)?;
        let interest_due = balance.interest_at(monthly_rate);
        let is_last = installment_no == term_months;

        // the final installment absorbs whatever rounding left behind
        let principal_due = if is_last {
            balance
        } else {
            let scheduled = match amortization {
                Amortization::Level {
                    payment,
                    allow_zero_principal,
                } => {
                    let part = payment - interest_due;
                    if part.is_negative() {
                        return Err(CalcError::InfeasiblePayment {
                            payment,
                            interest: interest_due,
                        });
                    }
                    if part.is_zero() && !allow_zero_principal {
                        return Err(CalcError::invalid_input(format!(
                            "installment {} repays no principal",
                            installment_no
                        )));
                    }
                    part
                }
                Amortization::ConstantPrincipal { part } => part,
            };

            if scheduled >= balance {
                return Err(CalcError::invalid_input(format!(
                    "installment {} of {} already retires the balance",
                    installment_no, term_months
                )));
            }
            scheduled
        };

        balance -= principal_due;

        entries.push(ScheduleEntry {
            installment_no,
            due_date,
            principal_due,
            interest_due,
            fees_due,
            total_due: principal_due + interest_due + fees_due,
            principal_balance_after: balance,
            status: InstallmentStatus::Pending,
        });
    }

    Ok(entries)
}

/// start date plus whole calendar months, clamped to the end of shorter months
pub fn due_date(start: NaiveDate, installment_no: u32) -> Result<NaiveDate> {
    start
        .checked_add_months(Months::new(installment_no))
        .ok_or_else(|| CalcError::invalid_input(format!(
            "due date of installment {} is out of range",
            installment_no
        )))
}

/// convenience for callers holding rate and term separately
pub fn generate_with(terms: &LoanTerms, annual_rate: Percentage, term_months: u32) -> Result<Schedule> {
    generate(&terms.resolved(annual_rate, term_months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn loan(loan_type: LoanType, principal: i64, rate: Decimal, term: u32) -> LoanTerms {
        LoanTerms::builder()
            .loan_type(loan_type)
            .principal(Money::from_major(principal))
            .annual_rate(Percentage::new(rate))
            .term_months(term)
            .start_date(start())
            .build()
            .unwrap()
    }

    fn assert_terminates(schedule: &Schedule) {
        let last = schedule.entries.last().unwrap();
        assert_eq!(last.principal_balance_after, Money::ZERO);
        assert_eq!(schedule.total_principal(), schedule.principal);
        assert_eq!(schedule.len(), schedule.term_months as usize);

        for (idx, entry) in schedule.entries.iter().enumerate() {
            assert_eq!(entry.installment_no, idx as u32 + 1);
            assert_eq!(entry.total_due, entry.principal_due + entry.interest_due + entry.fees_due);
            assert!(!entry.principal_due.is_negative());
            assert!(!entry.interest_due.is_negative());
            assert_eq!(entry.status, InstallmentStatus::Pending);
        }
    }

    fn assert_strictly_decreasing(schedule: &Schedule) {
        let mut previous = schedule.principal;
        for entry in &schedule.entries {
            assert!(entry.principal_balance_after < previous);
            previous = entry.principal_balance_after;
        }
    }

    #[test]
    fn test_annuity_scenario() {
        let schedule = generate(&loan(LoanType::Annuity, 10_000, dec!(5.5), 60)).unwrap();

        assert_eq!(schedule.len(), 60);
        assert_eq!(schedule.first_payment(), Some(Money::from_decimal(dec!(191.01))));
        assert_eq!(schedule.entries[0].interest_due, Money::from_decimal(dec!(45.83)));
        assert_terminates(&schedule);
        assert_strictly_decreasing(&schedule);

        // level payment on every installment but the last
        for entry in &schedule.entries[..59] {
            assert_eq!(entry.total_due, Money::from_decimal(dec!(191.01)));
        }
        let last = schedule.last_payment().unwrap();
        assert!((last - Money::from_decimal(dec!(191.01))).abs() < Money::ONE);
    }

    #[test]
    fn test_fixed_principal_scenario() {
        let terms = LoanTerms {
            fixed_principal_payment: Some(Money::from_major(1_000)),
            ..loan(LoanType::FixedPrincipal, 12_000, dec!(4), 12)
        };
        let schedule = generate(&terms).unwrap();

        assert_eq!(schedule.first_payment(), Some(Money::from_decimal(dec!(1040.00))));
        assert_eq!(schedule.last_payment(), Some(Money::from_decimal(dec!(1003.33))));
        assert_terminates(&schedule);
        assert_strictly_decreasing(&schedule);

        for pair in schedule.entries.windows(2) {
            assert!(pair[1].total_due < pair[0].total_due);
        }
    }

    #[test]
    fn test_fixed_principal_default_part_absorbs_remainder() {
        let schedule = generate(&loan(LoanType::FixedPrincipal, 100, dec!(12), 3)).unwrap();

        assert_eq!(schedule.entries[0].principal_due, Money::from_decimal(dec!(33.33)));
        assert_eq!(schedule.entries[1].principal_due, Money::from_decimal(dec!(33.33)));
        assert_eq!(schedule.entries[2].principal_due, Money::from_decimal(dec!(33.34)));
        assert_terminates(&schedule);
    }

    #[test]
    fn test_interest_only_scenario() {
        let terms = LoanTerms {
            balloon_amount: Some(Money::from_major(5_000)),
            ..loan(LoanType::InterestOnly, 5_000, dec!(6), 24)
        };
        let schedule = generate(&terms).unwrap();

        for entry in &schedule.entries[..23] {
            assert_eq!(entry.principal_due, Money::ZERO);
            assert_eq!(entry.interest_due, Money::from_major(25));
            assert_eq!(entry.principal_balance_after, Money::from_major(5_000));
        }
        let last = &schedule.entries[23];
        assert_eq!(last.principal_due, Money::from_major(5_000));
        assert_eq!(last.interest_due, Money::from_major(25));
        assert_eq!(last.total_due, Money::from_major(5_025));
        assert_terminates(&schedule);
    }

    #[test]
    fn test_interest_only_balloon_defaults_to_principal() {
        let schedule = generate(&loan(LoanType::InterestOnly, 5_000, dec!(6), 24)).unwrap();
        assert_eq!(schedule.entries[23].principal_due, Money::from_major(5_000));
        assert_eq!(schedule.total_interest, Money::from_major(600));
    }

    #[test]
    fn test_interest_only_partial_balloon_amortizes_the_rest() {
        let terms = LoanTerms {
            balloon_amount: Some(Money::from_major(3_000)),
            ..loan(LoanType::InterestOnly, 5_000, dec!(6), 24)
        };
        let schedule = generate(&terms).unwrap();

        assert_terminates(&schedule);
        assert_strictly_decreasing(&schedule);
        // the last installment carries the balloon on top of a regular payment
        let level = schedule.entries[0].total_due;
        let last = schedule.last_payment().unwrap();
        assert!((last - level - Money::from_major(3_000)).abs() < Money::ONE);
    }

    fn assert_non_increasing(schedule: &Schedule) {
        let mut previous = schedule.principal;
        for entry in &schedule.entries {
            assert!(entry.principal_balance_after <= previous);
            previous = entry.principal_balance_after;
        }
    }

    #[test]
    fn test_interest_only_half_cent_interest() {
        // 5001 * 0.5% = 25.005 rounds up; the payment must follow it
        let schedule = generate(&loan(LoanType::InterestOnly, 5_001, dec!(6), 24)).unwrap();
        for entry in &schedule.entries[..23] {
            assert_eq!(entry.principal_due, Money::ZERO);
            assert_eq!(entry.interest_due, Money::from_decimal(dec!(25.01)));
        }
        assert_eq!(schedule.entries[23].principal_due, Money::from_major(5_001));
        assert_terminates(&schedule);
    }

    #[test]
    fn test_interest_only_every_cent_principal() {
        for cents in 10_000..20_000 {
            let terms = LoanTerms {
                principal: Money::from_minor(cents),
                ..loan(LoanType::InterestOnly, 100, dec!(6), 24)
            };
            let schedule = generate(&terms)
                .unwrap_or_else(|e| panic!("principal {}: {}", terms.principal, e));
            assert_terminates(&schedule);
            assert_non_increasing(&schedule);
            assert!(schedule.entries[..23].iter().all(|e| e.principal_due.is_zero()));
        }
    }

    #[test]
    fn test_long_terms_on_small_principals() {
        let fixed = generate(&loan(LoanType::FixedPrincipal, 200, dec!(5), 360)).unwrap();
        assert_eq!(fixed.entries[0].principal_due, Money::from_decimal(dec!(0.55)));
        assert_eq!(fixed.entries[359].principal_due, Money::from_decimal(dec!(2.55)));
        assert_terminates(&fixed);
        assert_strictly_decreasing(&fixed);

        let level = generate(&loan(LoanType::Annuity, 200, Decimal::ZERO, 360)).unwrap();
        assert_eq!(level.entries[0].total_due, Money::from_decimal(dec!(0.55)));
        assert_terminates(&level);
        assert_strictly_decreasing(&level);
    }

    #[test]
    fn test_schedule_properties_across_inputs() {
        let principals = [
            dec!(100.00),
            dec!(100.01),
            dec!(101.00),
            dec!(199.99),
            dec!(200.00),
            dec!(303.03),
            dec!(1001.00),
            dec!(2501.00),
            dec!(5001.00),
            dec!(12345.67),
            dec!(98765.43),
        ];
        let rates = [dec!(0), dec!(0.5), dec!(3.99), dec!(6), dec!(9.25), dec!(12)];
        let terms = [1, 2, 3, 7, 12, 60, 120, 360];

        for principal in principals {
            for rate in rates {
                for term in terms {
                    let base = LoanTerms {
                        principal: Money::from_decimal(principal),
                        ..loan(LoanType::Annuity, 100, rate, term)
                    };
                    let label = format!("principal {} rate {} term {}", principal, rate, term);

                    for loan_type in [LoanType::Annuity, LoanType::AutoLoan, LoanType::FixedPrincipal] {
                        let terms = LoanTerms { loan_type, ..base.clone() };
                        let schedule = generate(&terms)
                            .unwrap_or_else(|e| panic!("{} {}: {}", loan_type, label, e));
                        assert_terminates(&schedule);
                        assert_strictly_decreasing(&schedule);
                    }

                    for balloon in [None, Some(Money::from_decimal(principal / dec!(2)))] {
                        let terms = LoanTerms {
                            loan_type: LoanType::InterestOnly,
                            balloon_amount: balloon,
                            ..base.clone()
                        };
                        let schedule = generate(&terms)
                            .unwrap_or_else(|e| panic!("interest_only {} balloon {:?}: {}", label, balloon, e));
                        assert_terminates(&schedule);
                        assert_non_increasing(&schedule);
                    }
                }
            }
        }
    }

    #[test]
    fn test_auto_loan_matches_annuity() {
        let annuity = generate(&loan(LoanType::Annuity, 25_000, dec!(7.9), 48)).unwrap();
        let auto = generate(&loan(LoanType::AutoLoan, 25_000, dec!(7.9), 48)).unwrap();

        assert_eq!(annuity.entries, auto.entries);
        assert_eq!(auto.loan_type, LoanType::AutoLoan);
    }

    #[test]
    fn test_zero_rate_annuity() {
        let schedule = generate(&loan(LoanType::Annuity, 1_000, Decimal::ZERO, 3)).unwrap();
        assert_eq!(schedule.entries[0].total_due, Money::from_decimal(dec!(333.33)));
        assert_eq!(schedule.entries[2].total_due, Money::from_decimal(dec!(333.34)));
        assert_eq!(schedule.total_interest, Money::ZERO);
        assert_terminates(&schedule);
    }

    #[test]
    fn test_fees_are_additive() {
        let terms = LoanTerms {
            fee_setup: Money::from_major(200),
            fee_monthly: Money::from_major(5),
            insurance_monthly: Money::from_decimal(dec!(12.50)),
            ..loan(LoanType::Annuity, 10_000, dec!(5.5), 60)
        };
        let plain = generate(&loan(LoanType::Annuity, 10_000, dec!(5.5), 60)).unwrap();
        let with_fees = generate(&terms).unwrap();

        for (a, b) in plain.entries.iter().zip(&with_fees.entries) {
            assert_eq!(a.principal_due, b.principal_due);
            assert_eq!(a.interest_due, b.interest_due);
            assert_eq!(b.fees_due, Money::from_decimal(dec!(17.50)));
        }
        assert_eq!(with_fees.total_fees, Money::from_major(1_250));
        assert_eq!(
            with_fees.total_payment,
            plain.total_payment + with_fees.total_fees
        );
        assert_terminates(&with_fees);
    }

    #[test]
    fn test_pinned_annuity_payment() {
        let terms = LoanTerms {
            fixed_monthly_payment: Some(Money::from_major(192)),
            ..loan(LoanType::Annuity, 10_000, dec!(5.5), 60)
        };
        let schedule = generate(&terms).unwrap();

        assert_eq!(schedule.first_payment(), Some(Money::from_major(192)));
        // 192 overpays the level 191.01, so the final installment shrinks
        assert!(schedule.last_payment().unwrap() < Money::from_major(192));
        assert_terminates(&schedule);
    }

    #[test]
    fn test_pinned_payment_below_interest() {
        let terms = LoanTerms {
            fixed_monthly_payment: Some(Money::from_major(40)),
            ..loan(LoanType::Annuity, 10_000, dec!(5.5), 60)
        };
        let err = generate(&terms).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InfeasiblePayment);
    }

    #[test]
    fn test_pinned_payment_retiring_early() {
        let terms = LoanTerms {
            fixed_monthly_payment: Some(Money::from_major(5_000)),
            ..loan(LoanType::Annuity, 10_000, dec!(5.5), 60)
        };
        let err = generate(&terms).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let terms = LoanTerms {
            fixed_principal_payment: Some(Money::from_major(2_000)),
            ..loan(LoanType::FixedPrincipal, 12_000, dec!(4), 12)
        };
        assert_eq!(generate(&terms).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_unresolved_terms_rejected() {
        let terms = LoanTerms {
            term_months: None,
            ..loan(LoanType::Annuity, 10_000, dec!(5.5), 60)
        };
        assert_eq!(generate(&terms).unwrap_err().kind(), ErrorKind::InvalidInput);

        let terms = LoanTerms {
            principal: Money::ZERO,
            ..loan(LoanType::Annuity, 10_000, dec!(5.5), 60)
        };
        assert_eq!(generate(&terms).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_due_dates_follow_calendar_months() {
        let terms = LoanTerms {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ..loan(LoanType::Annuity, 1_200, dec!(3), 4)
        };
        let schedule = generate(&terms).unwrap();
        let dates: Vec<NaiveDate> = schedule.entries.iter().map(|e| e.due_date).collect();

        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(dates[3], NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(schedule.maturity_date(), Some(dates[3]));
    }

    #[test]
    fn test_single_installment() {
        let schedule = generate(&loan(LoanType::Annuity, 1_000, dec!(12), 1)).unwrap();
        assert_eq!(schedule.entries[0].principal_due, Money::from_major(1_000));
        assert_eq!(schedule.entries[0].interest_due, Money::from_major(10));
        assert_terminates(&schedule);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let terms = loan(LoanType::FixedPrincipal, 87_500, dec!(6.35), 240);
        assert_eq!(generate(&terms).unwrap(), generate(&terms).unwrap());
    }

    #[test]
    fn test_generate_with_resolves_copy() {
        let terms = LoanTerms {
            annual_rate: None,
            ..loan(LoanType::Annuity, 10_000, dec!(5.5), 60)
        };
        let schedule = generate_with(&terms, Percentage::new(dec!(5.5)), 60).unwrap();
        assert_eq!(schedule.len(), 60);
        assert!(terms.annual_rate.is_none());
    }
}
