//! Unit tests for the budget ledger.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use buildtrack_shared::types::{PhaseId, ProjectId};

use crate::model::DeptKey;

use super::service::BudgetLedger;
use super::types::Totals;

fn ledger() -> BudgetLedger {
    BudgetLedger::new(ProjectId::from("p1"))
}

fn ph(id: &str) -> PhaseId {
    PhaseId::from(id)
}

#[test]
fn test_phase_budget_tracks_department_edits() {
    let mut ledger = ledger();
    let phase = ph("ph1");

    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Electrical"), dec!(40_000));
    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Plumbing"), dec!(25_000));
    assert_eq!(
        ledger.phase_totals(&phase),
        Some(Totals::new(dec!(65_000), dec!(0)))
    );

    // Re-pricing a department recomputes the phase budget immediately.
    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Electrical"), dec!(50_000));
    assert_eq!(ledger.phase_totals(&phase).unwrap().budget, dec!(75_000));

    ledger.remove_department(&DeptKey::new(phase.clone(), "Plumbing"));
    assert_eq!(ledger.phase_totals(&phase).unwrap().budget, dec!(50_000));
}

#[test]
fn test_single_phase_approved_expense_scenario() {
    // Single project, single phase, budget 100,000, one approved expense
    // of 30,000 -> (100000, 30000). Rejecting that expense afterwards
    // restores (100000, 0).
    let mut ledger = ledger();
    let phase = ph("ph1");
    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Civil"), dec!(100_000));

    assert!(ledger
        .apply_expense_delta(&phase, "Civil", dec!(30_000))
        .is_none());
    assert_eq!(
        ledger.phase_totals(&phase),
        Some(Totals::new(dec!(100_000), dec!(30_000)))
    );

    assert!(ledger
        .apply_expense_delta(&phase, "Civil", dec!(-30_000))
        .is_none());
    assert_eq!(
        ledger.phase_totals(&phase),
        Some(Totals::new(dec!(100_000), dec!(0)))
    );
}

#[test]
fn test_approve_reject_round_trip_is_exact() {
    let mut ledger = ledger();
    let phase = ph("ph1");
    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Civil"), dec!(10_000));
    ledger.apply_expense_delta(&phase, "Civil", dec!(1_234.56));

    let before = ledger.phase_totals(&phase).unwrap();
    ledger.apply_expense_delta(&phase, "Civil", dec!(777.77));
    ledger.apply_expense_delta(&phase, "Civil", dec!(-777.77));
    assert_eq!(ledger.phase_totals(&phase).unwrap(), before);
}

#[test]
fn test_negative_crossing_delta_clamps_and_warns() {
    let mut ledger = ledger();
    let phase = ph("ph1");
    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Civil"), dec!(10_000));
    ledger.apply_expense_delta(&phase, "Civil", dec!(100));

    let warning = ledger
        .apply_expense_delta(&phase, "Civil", dec!(-250))
        .expect("crossing delta must warn");
    assert_eq!(warning.prior_spent, dec!(100));
    assert_eq!(warning.attempted_delta, dec!(-250));
    assert_eq!(ledger.department_spent(&phase, "Civil"), dec!(0));
    assert_eq!(ledger.phase_totals(&phase).unwrap().spent, dec!(0));

    let drained = ledger.take_warnings();
    assert_eq!(drained.len(), 1);
    assert!(ledger.take_warnings().is_empty());
}

#[test]
fn test_composite_and_bare_keys_read_the_same_entry() {
    let mut ledger = ledger();
    let phase = ph("ph1");
    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Electrical"), dec!(5_000));

    ledger.apply_expense_delta(&phase, "ph1_Electrical", dec!(300));
    ledger.apply_expense_delta(&phase, "Electrical", dec!(200));

    assert_eq!(ledger.department_spent(&phase, "Electrical"), dec!(500));
    assert_eq!(ledger.department_spent(&phase, "ph1_Electrical"), dec!(500));
    assert!(ledger.has_department(&phase, "ph1_Electrical"));
    assert!(ledger.has_department(&phase, "Electrical"));
}

#[test]
fn test_project_totals_roll_up_phases() {
    let mut ledger = ledger();
    ledger.set_department_budget(&DeptKey::new(ph("ph1"), "Civil"), dec!(60_000));
    ledger.set_department_budget(&DeptKey::new(ph("ph2"), "Civil"), dec!(40_000));
    ledger.apply_expense_delta(&ph("ph1"), "Civil", dec!(10_000));
    ledger.apply_expense_delta(&ph("ph2"), "Civil", dec!(5_000));

    assert_eq!(
        ledger.project_totals(),
        Totals::new(dec!(100_000), dec!(15_000))
    );
}

#[test]
fn test_department_totals_merge_same_name_across_phases() {
    let mut ledger = ledger();
    ledger.set_department_budget(&DeptKey::new(ph("ph1"), "Civil"), dec!(60_000));
    ledger.set_department_budget(&DeptKey::new(ph("ph2"), "Civil"), dec!(40_000));
    ledger.set_department_budget(&DeptKey::new(ph("ph2"), "Steel"), dec!(20_000));
    ledger.apply_expense_delta(&ph("ph1"), "Civil", dec!(1_000));
    ledger.apply_expense_delta(&ph("ph2"), "Civil", dec!(2_000));

    let by_dept = ledger.department_totals_across_phases();
    assert_eq!(by_dept["Civil"], Totals::new(dec!(100_000), dec!(3_000)));
    assert_eq!(by_dept["Steel"], Totals::new(dec!(20_000), dec!(0)));
}

#[test]
fn test_other_bucket_is_flat_and_budgetless() {
    let mut ledger = ledger();
    ledger.apply_other_delta(dec!(500));
    ledger.apply_other_delta(dec!(250));
    assert_eq!(ledger.other_expenses_total(), dec!(750));
    // Other expenses never appear in phase or project totals.
    assert_eq!(ledger.project_totals(), Totals::default());

    let warning = ledger.apply_other_delta(dec!(-1_000)).unwrap();
    assert_eq!(warning.prior_spent, dec!(750));
    assert_eq!(ledger.other_expenses_total(), dec!(0));
}

#[test]
fn test_cold_load_derives_spent_once() {
    let mut ledger = ledger();
    let phase = ph("ph1");
    let budgets = BTreeMap::from([
        ("Civil".to_string(), dec!(80_000)),
        ("Steel".to_string(), dec!(20_000)),
    ]);
    let spent = BTreeMap::from([("Civil".to_string(), dec!(12_500))]);
    ledger.load_phase(phase.clone(), budgets, spent);

    assert_eq!(
        ledger.phase_totals(&phase),
        Some(Totals::new(dec!(100_000), dec!(12_500)))
    );
}

#[test]
fn test_remove_phase_drops_entries() {
    let mut ledger = ledger();
    let phase = ph("ph1");
    ledger.set_department_budget(&DeptKey::new(phase.clone(), "Civil"), dec!(10_000));
    ledger.remove_phase(&phase);
    assert_eq!(ledger.phase_totals(&phase), None);
    assert_eq!(ledger.project_totals(), Totals::default());
}

#[test]
fn test_utilization_and_remaining() {
    let totals = Totals::new(dec!(100_000), dec!(30_000));
    assert_eq!(totals.remaining(), dec!(70_000));
    assert_eq!(totals.utilization_percent(), dec!(30.00));
    assert_eq!(Totals::new(Decimal::ZERO, dec!(5)).utilization_percent(), dec!(0));
}
