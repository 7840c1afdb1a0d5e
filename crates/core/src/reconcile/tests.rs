//! Unit tests for the expense reconciler.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use buildtrack_shared::types::{ExpenseId, PhaseId, ProjectId, UserId};

use crate::ledger::{BudgetLedger, Totals};
use crate::model::{DeptKey, Expense, ExpenseStatus};

use super::error::ReconcileError;
use super::service::ExpenseReconciler;

fn ledger_with_budget() -> BudgetLedger {
    let mut ledger = BudgetLedger::new(ProjectId::from("p1"));
    ledger.set_department_budget(&DeptKey::new(PhaseId::from("ph1"), "Civil"), dec!(100_000));
    ledger
}

fn expense(id: &str, amount: Decimal) -> Expense {
    Expense {
        id: ExpenseId::from(id),
        project_id: ProjectId::from("p1"),
        phase_id: Some(PhaseId::from("ph1")),
        department: "Civil".to_string(),
        amount,
        status: ExpenseStatus::Pending,
        is_anonymous: false,
        business_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        submitted_by: None,
        created_at: Utc::now(),
        decided_at: None,
        decided_by: None,
    }
}

#[test]
fn test_approve_applies_delta_and_stamps_decision() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(30_000));
    let approver = UserId::from("u1");

    let outcome = ExpenseReconciler::decide(
        &mut ledger,
        &mut exp,
        ExpenseStatus::Approved,
        Some(approver.clone()),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(outcome.from, ExpenseStatus::Pending);
    assert_eq!(outcome.to, ExpenseStatus::Approved);
    assert!(!outcome.routed_to_other);
    assert!(outcome.warnings.is_empty());
    assert_eq!(exp.status, ExpenseStatus::Approved);
    assert_eq!(exp.decided_by, Some(approver));
    assert!(exp.decided_at.is_some());
    assert_eq!(
        ledger.phase_totals(&PhaseId::from("ph1")),
        Some(Totals::new(dec!(100_000), dec!(30_000)))
    );
}

#[test]
fn test_reject_has_no_ledger_effect() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(30_000));

    ExpenseReconciler::decide(&mut ledger, &mut exp, ExpenseStatus::Rejected, None, Utc::now())
        .unwrap();

    assert_eq!(exp.status, ExpenseStatus::Rejected);
    assert_eq!(ledger.phase_totals(&PhaseId::from("ph1")).unwrap().spent, dec!(0));
}

#[test]
fn test_decide_applies_only_to_pending() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(100));
    exp.status = ExpenseStatus::Approved;

    let err = ExpenseReconciler::decide(
        &mut ledger,
        &mut exp,
        ExpenseStatus::Rejected,
        None,
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, ReconcileError::NotPending { .. }));
}

#[test]
fn test_pending_is_not_a_decision_target() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(100));
    let err = ExpenseReconciler::decide(
        &mut ledger,
        &mut exp,
        ExpenseStatus::Pending,
        None,
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, ReconcileError::PendingNotADecision(_)));
}

#[test]
fn test_approve_then_reverse_restores_spent_exactly() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(30_000));
    let phase = PhaseId::from("ph1");

    ExpenseReconciler::decide(&mut ledger, &mut exp, ExpenseStatus::Approved, None, Utc::now())
        .unwrap();
    assert_eq!(ledger.phase_totals(&phase).unwrap().spent, dec!(30_000));

    let outcome = ExpenseReconciler::reverse(
        &mut ledger,
        &mut exp,
        ExpenseStatus::Rejected,
        None,
        Utc::now(),
    )
    .unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(exp.status, ExpenseStatus::Rejected);
    assert_eq!(
        ledger.phase_totals(&phase),
        Some(Totals::new(dec!(100_000), dec!(0)))
    );
}

#[test]
fn test_reject_to_approve_reversal_applies_amount() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(12_500));
    ExpenseReconciler::decide(&mut ledger, &mut exp, ExpenseStatus::Rejected, None, Utc::now())
        .unwrap();

    ExpenseReconciler::reverse(&mut ledger, &mut exp, ExpenseStatus::Approved, None, Utc::now())
        .unwrap();
    assert_eq!(
        ledger.phase_totals(&PhaseId::from("ph1")).unwrap().spent,
        dec!(12_500)
    );
}

#[test]
fn test_reversal_rejects_invalid_pairs() {
    let mut ledger = ledger_with_budget();
    let mut pending = expense("e1", dec!(100));
    let err = ExpenseReconciler::reverse(
        &mut ledger,
        &mut pending,
        ExpenseStatus::Approved,
        None,
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidReversal { .. }));

    let mut approved = expense("e2", dec!(100));
    approved.status = ExpenseStatus::Approved;
    let err = ExpenseReconciler::reverse(
        &mut ledger,
        &mut approved,
        ExpenseStatus::Approved,
        None,
        Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidReversal { .. }));
}

#[test]
fn test_anonymous_expense_routes_to_other_bucket() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(5_000));
    exp.is_anonymous = true;

    let outcome = ExpenseReconciler::decide(
        &mut ledger,
        &mut exp,
        ExpenseStatus::Approved,
        None,
        Utc::now(),
    )
    .unwrap();

    assert!(outcome.routed_to_other);
    assert_eq!(ledger.other_expenses_total(), dec!(5_000));
    // Excluded from per-department totals.
    assert_eq!(ledger.phase_totals(&PhaseId::from("ph1")).unwrap().spent, dec!(0));
}

#[test]
fn test_unknown_department_routes_to_other_bucket() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(750));
    exp.department = "Landscaping".to_string();

    let outcome = ExpenseReconciler::decide(
        &mut ledger,
        &mut exp,
        ExpenseStatus::Approved,
        None,
        Utc::now(),
    )
    .unwrap();

    assert!(outcome.routed_to_other);
    assert_eq!(ledger.other_expenses_total(), dec!(750));
}

#[test]
fn test_phaseless_expense_routes_to_other_bucket() {
    let mut ledger = ledger_with_budget();
    let mut exp = expense("e1", dec!(200));
    exp.phase_id = None;

    let outcome = ExpenseReconciler::decide(
        &mut ledger,
        &mut exp,
        ExpenseStatus::Approved,
        None,
        Utc::now(),
    )
    .unwrap();
    assert!(outcome.routed_to_other);
    assert_eq!(ledger.other_expenses_total(), dec!(200));
}

#[test]
fn test_batch_failures_do_not_roll_back_siblings() {
    let mut ledger = ledger_with_budget();
    let mut expenses = vec![
        expense("e1", dec!(1_000)),
        {
            let mut e = expense("e2", dec!(2_000));
            e.status = ExpenseStatus::Rejected; // not pending -> item fails
            e
        },
        expense("e3", dec!(3_000)),
    ];

    let outcome = ExpenseReconciler::decide_batch(
        &mut ledger,
        &mut expenses,
        ExpenseStatus::Approved,
        None,
        Utc::now(),
    );

    assert_eq!(outcome.applied_count(), 2);
    assert_eq!(outcome.failed_count(), 1);
    assert!(outcome.items[0].result.is_ok());
    assert!(outcome.items[1].result.is_err());
    assert!(outcome.items[2].result.is_ok());

    // The single end-of-batch recalculation reflects both applied items.
    assert_eq!(outcome.project_totals, Totals::new(dec!(100_000), dec!(4_000)));
    assert_eq!(
        outcome.department_totals["Civil"],
        Totals::new(dec!(100_000), dec!(4_000))
    );
}
