use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::LoanId;

/// events emitted while recording payments against a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    InstallmentPaid {
        loan_id: LoanId,
        installment_no: u32,
        due_date: NaiveDate,
        amount: Money,
        paid_at: DateTime<Utc>,
        /// paid after its due date
        late: bool,
    },
    DuplicatePaymentIgnored {
        loan_id: LoanId,
        installment_no: u32,
        original_paid_at: DateTime<Utc>,
        attempted_at: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::InstallmentPaid { loan_id, .. }
            | Event::DuplicatePaymentIgnored { loan_id, .. }
            | Event::LoanRepaid { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
