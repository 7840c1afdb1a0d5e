//! Project lifecycle state machine.
//!
//! Owns project status and the four date fields (planned, handover,
//! maintenance, suspension) together with the transition rules that mutate
//! them. Transitions that would change dates are planned first and applied
//! only after explicit caller confirmation.

pub mod error;
pub mod machine;
pub mod types;


pub use error::LifecycleError;
pub use machine::LifecycleMachine;
pub use types::{
    DateChange, DateField, HandoverEffect, PhaseDateChange, StatusPolicy, TransitionPlan,
};
