//! Property-based tests for the budget ledger.
//!
//! - Property 1: spent never goes negative for any delta sequence
//! - Property 2: phase budget always equals the sum of department budgets
//! - Property 3: an approve/reject pair is an exact no-op

use proptest::prelude::*;
use rust_decimal::Decimal;

use buildtrack_shared::types::{PhaseId, ProjectId};

use crate::model::DeptKey;

use super::service::BudgetLedger;

/// Strategy for signed deltas in cents (-10,000.00 to 10,000.00).
fn signed_delta() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for non-negative budget amounts in cents.
fn budget_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for department names from a small pool, to force collisions.
fn dept_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Civil".to_string()),
        Just("Steel".to_string()),
        Just("Electrical".to_string()),
    ]
}

proptest! {
    #[test]
    fn prop_spent_never_negative(deltas in prop::collection::vec((dept_name(), signed_delta()), 0..50)) {
        let mut ledger = BudgetLedger::new(ProjectId::from("p1"));
        let phase = PhaseId::from("ph1");

        for (name, delta) in deltas {
            ledger.apply_expense_delta(&phase, &name, delta);
            prop_assert!(ledger.department_spent(&phase, &name) >= Decimal::ZERO);
            if let Some(totals) = ledger.phase_totals(&phase) {
                prop_assert!(totals.spent >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn prop_phase_budget_equals_department_sum(
        edits in prop::collection::vec((dept_name(), budget_amount()), 1..30),
        removals in prop::collection::vec(dept_name(), 0..10),
    ) {
        let mut ledger = BudgetLedger::new(ProjectId::from("p1"));
        let phase = PhaseId::from("ph1");
        let mut expected = std::collections::BTreeMap::new();

        for (name, amount) in edits {
            ledger.set_department_budget(&DeptKey::new(phase.clone(), &name), amount);
            expected.insert(name, amount);
            let sum: Decimal = expected.values().copied().sum();
            prop_assert_eq!(ledger.phase_totals(&phase).unwrap().budget, sum);
        }
        for name in removals {
            ledger.remove_department(&DeptKey::new(phase.clone(), &name));
            expected.remove(&name);
            let sum: Decimal = expected.values().copied().sum();
            prop_assert_eq!(ledger.phase_totals(&phase).unwrap().budget, sum);
        }
    }

    #[test]
    fn prop_reversal_pair_is_noop(
        baseline in prop::collection::vec((dept_name(), signed_delta()), 0..20),
        amount in (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        name in dept_name(),
    ) {
        let mut ledger = BudgetLedger::new(ProjectId::from("p1"));
        let phase = PhaseId::from("ph1");
        for (dept, delta) in baseline {
            ledger.apply_expense_delta(&phase, &dept, delta);
        }

        let before = ledger.phase_totals(&phase).map(|t| t.spent);
        // Approve then immediately reject the same expense: no warnings may
        // fire (the positive leg always precedes the negative one) and the
        // spent total must be restored exactly.
        prop_assert!(ledger.apply_expense_delta(&phase, &name, amount).is_none());
        prop_assert!(ledger.apply_expense_delta(&phase, &name, -amount).is_none());
        let after = ledger.phase_totals(&phase).map(|t| t.spent);
        prop_assert_eq!(before.unwrap_or_default(), after.unwrap_or_default());
    }
}
