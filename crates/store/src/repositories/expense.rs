//! Expense repository: submission, decisions, reversals, totals.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use buildtrack_shared::types::{ExpenseId, PhaseId, ProjectId, UserId};
use buildtrack_shared::{AppError, AppResult};

use buildtrack_core::events::DomainEvent;
use buildtrack_core::ledger::Totals;
use buildtrack_core::model::{Expense, ExpenseStatus};
use buildtrack_core::reconcile::{
    BatchItemOutcome, BatchOutcome, DecisionOutcome, ExpenseReconciler, ReconcileError,
};

use crate::codec;
use crate::paths;

use super::project::load_project;
use super::StoreContext;

/// Input for a new expense submission.
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// Phase the expense is booked against, if any.
    pub phase_id: Option<PhaseId>,
    /// Department wire key or bare name.
    pub department: String,
    /// Amount, strictly positive.
    pub amount: Decimal,
    /// Anonymous submissions bypass department attribution.
    pub is_anonymous: bool,
    /// Business date the cost belongs to.
    pub business_date: NaiveDate,
    /// Submitting user.
    pub submitted_by: Option<UserId>,
}

/// Snapshot of a project's budget aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    /// Budget and spent across all phases.
    pub project: Totals,
    /// Totals per department name, merged across phases.
    pub departments: BTreeMap<String, Totals>,
    /// Flat Other Expenses amount, excluded from the totals above.
    pub other_expenses: Decimal,
}

/// Repository for expenses.
pub struct ExpenseRepository {
    ctx: Arc<StoreContext>,
}

impl ExpenseRepository {
    /// Creates the repository.
    #[must_use]
    pub const fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Submits a pending expense.
    pub async fn submit(&self, project_id: &ProjectId, input: NewExpense) -> AppResult<Expense> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "expense amount must be strictly positive".into(),
            ));
        }
        if !input.is_anonymous && input.department.trim().is_empty() {
            return Err(AppError::Validation(
                "expense department must not be empty".into(),
            ));
        }

        let _guard = self.ctx.locks.acquire(project_id).await;
        load_project(&self.ctx, project_id).await?;

        let expense = Expense {
            id: ExpenseId::new(),
            project_id: project_id.clone(),
            phase_id: input.phase_id,
            department: input.department,
            amount: input.amount,
            status: ExpenseStatus::Pending,
            is_anonymous: input.is_anonymous,
            business_date: input.business_date,
            submitted_by: input.submitted_by,
            created_at: Utc::now(),
            decided_at: None,
            decided_by: None,
        };
        self.persist(project_id, &expense).await?;
        info!(project = %project_id, expense = %expense.id, "expense submitted");
        Ok(expense)
    }

    /// Loads one expense.
    pub async fn get(&self, project_id: &ProjectId, expense_id: &ExpenseId) -> AppResult<Expense> {
        let path = paths::expense(&self.ctx.customer_id, project_id, expense_id);
        let doc = self
            .ctx
            .store
            .get(&path)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(path.clone()))?;
        Ok(codec::decode_expense(&doc.id, project_id, &doc.fields, &path)?)
    }

    /// Decides a pending expense (approve or reject).
    pub async fn decide(
        &self,
        project_id: &ProjectId,
        expense_id: &ExpenseId,
        to: ExpenseStatus,
        decided_by: Option<UserId>,
    ) -> AppResult<DecisionOutcome> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        self.ensure_ledger(project_id).await?;
        let mut expense = self.get(project_id, expense_id).await?;

        let outcome = self
            .with_ledger(project_id, |ledger| {
                ExpenseReconciler::decide(ledger, &mut expense, to, decided_by, Utc::now())
            })?
            .map_err(|e| AppError::BusinessRule(e.to_string()))?;

        self.persist(project_id, &expense).await?;
        self.publish_decided(&expense, &outcome);
        Ok(outcome)
    }

    /// Reverses a decided expense through a compensating pair.
    pub async fn reverse(
        &self,
        project_id: &ProjectId,
        expense_id: &ExpenseId,
        to: ExpenseStatus,
        decided_by: Option<UserId>,
    ) -> AppResult<DecisionOutcome> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        self.ensure_ledger(project_id).await?;
        let mut expense = self.get(project_id, expense_id).await?;

        let outcome = self
            .with_ledger(project_id, |ledger| {
                ExpenseReconciler::reverse(ledger, &mut expense, to, decided_by, Utc::now())
            })?
            .map_err(|e| AppError::BusinessRule(e.to_string()))?;

        self.persist(project_id, &expense).await?;
        self.publish_decided(&expense, &outcome);
        Ok(outcome)
    }

    /// Decides a batch of expenses.
    ///
    /// Items apply independently: an id that cannot be loaded becomes that
    /// item's failed outcome and never rolls back its siblings. Totals are
    /// recalculated once after the batch.
    pub async fn decide_batch(
        &self,
        project_id: &ProjectId,
        expense_ids: &[ExpenseId],
        to: ExpenseStatus,
        decided_by: Option<UserId>,
    ) -> AppResult<BatchOutcome> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        self.ensure_ledger(project_id).await?;

        let mut expenses = Vec::with_capacity(expense_ids.len());
        let mut missing = Vec::new();
        for (index, expense_id) in expense_ids.iter().enumerate() {
            match self.get(project_id, expense_id).await {
                Ok(expense) => expenses.push(expense),
                Err(AppError::NotFound(_)) => missing.push((index, expense_id.clone())),
                Err(other) => return Err(other),
            }
        }

        let mut outcome = self.with_ledger(project_id, |ledger| {
            ExpenseReconciler::decide_batch(ledger, &mut expenses, to, decided_by, Utc::now())
        })?;

        for (expense, item) in expenses.iter().zip(&outcome.items) {
            if let Ok(decision) = &item.result {
                self.persist(project_id, expense).await?;
                self.publish_decided(expense, decision);
            }
        }

        // Splice the unloadable ids back in input order.
        for (index, expense_id) in missing {
            outcome.items.insert(
                index,
                BatchItemOutcome {
                    expense_id: expense_id.clone(),
                    result: Err(ReconcileError::Missing(expense_id)),
                },
            );
        }
        info!(
            project = %project_id,
            applied = outcome.applied_count(),
            failed = outcome.failed_count(),
            "expense batch decided"
        );
        Ok(outcome)
    }

    /// Current budget aggregates for a project, read from the published
    /// ledger snapshot without taking the writer lock.
    pub async fn summary(&self, project_id: &ProjectId) -> AppResult<BudgetSummary> {
        self.ensure_ledger(project_id).await?;
        self.read_ledger(project_id, |ledger| BudgetSummary {
            project: ledger.project_totals(),
            departments: ledger.department_totals_across_phases(),
            other_expenses: ledger.other_expenses_total(),
        })
    }

    /// Budget and spent totals for one phase.
    pub async fn phase_totals(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
    ) -> AppResult<Option<Totals>> {
        self.ensure_ledger(project_id).await?;
        self.read_ledger(project_id, |ledger| ledger.phase_totals(phase_id))
    }

    async fn ensure_ledger(&self, project_id: &ProjectId) -> AppResult<()> {
        self.ctx
            .ledgers
            .ensure_loaded(self.ctx.store.as_ref(), &self.ctx.customer_id, project_id)
            .await
            .map_err(AppError::from)
    }

    fn with_ledger<R>(
        &self,
        project_id: &ProjectId,
        f: impl FnOnce(&mut buildtrack_core::ledger::BudgetLedger) -> R,
    ) -> AppResult<R> {
        self.ctx
            .ledgers
            .with(project_id, f)
            .ok_or_else(|| AppError::Internal(format!("no ledger loaded for {project_id}")))
    }

    fn read_ledger<R>(
        &self,
        project_id: &ProjectId,
        f: impl FnOnce(&buildtrack_core::ledger::BudgetLedger) -> R,
    ) -> AppResult<R> {
        self.ctx
            .ledgers
            .read(project_id, f)
            .ok_or_else(|| AppError::Internal(format!("no ledger loaded for {project_id}")))
    }

    fn publish_decided(&self, expense: &Expense, outcome: &DecisionOutcome) {
        self.ctx.events.publish(DomainEvent::ExpenseDecided {
            expense_id: expense.id.clone(),
            project_id: expense.project_id.clone(),
            from: outcome.from,
            to: outcome.to,
            amount: expense.amount,
        });
    }

    async fn persist(&self, project_id: &ProjectId, expense: &Expense) -> AppResult<()> {
        let path = paths::expense(&self.ctx.customer_id, project_id, &expense.id);
        self.ctx
            .store
            .merge(&path, codec::encode_expense(expense))
            .await
            .map_err(AppError::from)
    }
}
