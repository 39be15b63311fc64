pub mod calculator;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod lifecycle;
pub mod schedule;
pub mod serialization;
pub mod solver;
pub mod types;

// re-export key types
pub use calculator::{calculate, try_calculate, LoanCalculationResult, LoanRequest};
pub use config::{LoanTerms, LoanTermsBuilder, SolverConfig};
pub use decimal::{Money, Percentage};
pub use errors::{CalcError, ErrorKind, Result};
pub use events::{Event, EventStore};
pub use interest::{effective_rate, EffectiveRate};
pub use lifecycle::{
    days_overdue, derived_status, derived_status_with_time, LedgerSummary, PaymentLedger,
    PaymentRecord,
};
pub use schedule::{generate, Schedule, ScheduleEntry};
pub use serialization::{LoanRow, ScheduleRow};
pub use solver::{solve_rate_from_payment, solve_term_from_payment, SolveRequest};
pub use types::{
    DayCountConvention, DisplayStatus, InstallmentStatus, LoanId, LoanStatus, LoanType, RateType,
    Unknown,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
