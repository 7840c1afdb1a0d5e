//! Shared type definitions.

pub mod date;
pub mod id;

pub use date::{
    format_store_date, months_after, parse_store_date, spans_years, yesterday, STORE_DATE_FORMAT,
};
pub use id::{
    ChangeId, CustomerId, DepartmentId, ExpenseId, PhaseId, ProjectId, RequestId, UserId,
};
