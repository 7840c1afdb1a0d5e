//! Hierarchical budget-vs-spent aggregates.
//!
//! The ledger exclusively owns aggregate totals per (project, phase,
//! department). Budgets are recomputed from department allocations on every
//! edit; spent is maintained purely by signed deltas and recomputed from
//! the full expense set only on a cold load.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod props;

pub use service::BudgetLedger;
pub use types::{ReconciliationWarning, Totals};
