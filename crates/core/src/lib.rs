//! Core business logic for Buildtrack.
//!
//! This crate contains pure business logic with ZERO store or transport
//! dependencies. All domain types, transition rules, and calculations live
//! here.
//!
//! # Modules
//!
//! - `model` - Domain types (projects, phases, departments, expenses)
//! - `lifecycle` - Project status state machine and date cascade rules
//! - `ledger` - Hierarchical budget-vs-spent aggregates
//! - `reconcile` - Expense decision reconciliation into the ledger
//! - `analytics` - Filtered aggregation engine with debounced recompute
//! - `events` - Typed domain events over a broadcast bus
//! - `sync` - Per-project writer serialization and published snapshots

pub mod analytics;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod reconcile;
pub mod sync;
