//! Domain types shared across the lifecycle, ledger, and analytics modules.

pub mod expense;
pub mod key;
pub mod phase;
pub mod project;

pub use expense::{Expense, ExpenseStatus};
pub use key::DeptKey;
pub use phase::{Department, ExtensionRequest, ExtensionStatus, Phase, PhaseChange};
pub use project::{HandoverBaseline, Project, ProjectStatus};
