use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("infeasible payment: {payment} does not exceed first period interest {interest}")]
    InfeasiblePayment {
        payment: Money,
        interest: Money,
    },

    #[error("no convergence: {message}")]
    NoConvergence {
        message: String,
    },

    #[error("unsupported loan type: {message}")]
    UnsupportedLoanType {
        message: String,
    },
}

/// error discriminant carried by invalid calculation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InfeasiblePayment,
    NoConvergence,
    UnsupportedLoanType,
}

impl CalcError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn no_convergence(message: impl Into<String>) -> Self {
        CalcError::NoConvergence {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        CalcError::UnsupportedLoanType {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::InvalidInput { .. } => ErrorKind::InvalidInput,
            CalcError::InfeasiblePayment { .. } => ErrorKind::InfeasiblePayment,
            CalcError::NoConvergence { .. } => ErrorKind::NoConvergence,
            CalcError::UnsupportedLoanType { .. } => ErrorKind::UnsupportedLoanType,
        }
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
