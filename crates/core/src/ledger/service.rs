//! The in-memory budget ledger.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::warn;

use buildtrack_shared::types::{PhaseId, ProjectId};

use crate::model::DeptKey;

use super::types::{ReconciliationWarning, Totals};

/// Per-phase budget and spent maps, keyed by bare department name (the
/// phase context already disambiguates same-named departments).
#[derive(Debug, Clone, Default)]
struct PhaseLedger {
    budgets: BTreeMap<String, Decimal>,
    spent: BTreeMap<String, Decimal>,
    total_budget: Decimal,
    total_spent: Decimal,
}

impl PhaseLedger {
    /// Invariant: `total_budget` equals the sum of department budgets.
    /// Recomputed on every department mutation, never drifted.
    fn recompute_budget(&mut self) {
        self.total_budget = self.budgets.values().copied().sum();
    }
}

/// Hierarchical budget-vs-spent store for one project.
///
/// Supports point mutations without re-deriving from the full expense set.
/// Spent totals are maintained purely by signed deltas and never go
/// negative: a delta that would cross zero is clamped and surfaces a
/// [`ReconciliationWarning`].
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    project_id: ProjectId,
    phases: BTreeMap<PhaseId, PhaseLedger>,
    other_spent: Decimal,
    warnings: Vec<ReconciliationWarning>,
}

impl BudgetLedger {
    /// Creates an empty ledger for a project.
    #[must_use]
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            phases: BTreeMap::new(),
            other_spent: Decimal::ZERO,
            warnings: Vec::new(),
        }
    }

    /// The project this ledger belongs to.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Cold-loads a phase from stored department budgets and approved
    /// expense sums. This is the only path that derives spent from the
    /// full expense set; afterwards spent moves by signed deltas only.
    pub fn load_phase(
        &mut self,
        phase_id: PhaseId,
        budgets: BTreeMap<String, Decimal>,
        approved_spent: BTreeMap<String, Decimal>,
    ) {
        let mut ledger = PhaseLedger {
            total_spent: approved_spent.values().copied().sum(),
            budgets,
            spent: approved_spent,
            total_budget: Decimal::ZERO,
        };
        ledger.recompute_budget();
        self.phases.insert(phase_id, ledger);
    }

    /// Sets (or creates) a department budget, recomputing the phase budget
    /// total immediately.
    pub fn set_department_budget(&mut self, key: &DeptKey, amount: Decimal) {
        let phase = self.phases.entry(key.phase_id.clone()).or_default();
        phase.budgets.insert(key.name.clone(), amount);
        phase.recompute_budget();
    }

    /// Removes a department and its aggregates from a phase.
    pub fn remove_department(&mut self, key: &DeptKey) {
        if let Some(phase) = self.phases.get_mut(&key.phase_id) {
            phase.budgets.remove(&key.name);
            if let Some(spent) = phase.spent.remove(&key.name) {
                phase.total_spent -= spent;
            }
            phase.recompute_budget();
        }
    }

    /// Removes a phase and all its ledger entries.
    pub fn remove_phase(&mut self, phase_id: &PhaseId) {
        self.phases.remove(phase_id);
    }

    /// Returns true if the phase has a live department under this wire key
    /// (composite or bare form).
    #[must_use]
    pub fn has_department(&self, phase_id: &PhaseId, raw_key: &str) -> bool {
        let key = DeptKey::parse_in_phase(raw_key, phase_id);
        self.phases
            .get(phase_id)
            .is_some_and(|p| p.budgets.contains_key(&key.name))
    }

    /// Applies a signed expense delta at (phase, department).
    ///
    /// Accepts composite or bare wire keys. Department spent never goes
    /// negative: a crossing delta clamps at zero and records a
    /// reconciliation warning instead of failing.
    pub fn apply_expense_delta(
        &mut self,
        phase_id: &PhaseId,
        raw_key: &str,
        delta: Decimal,
    ) -> Option<ReconciliationWarning> {
        let key = DeptKey::parse_in_phase(raw_key, phase_id);
        let phase = self.phases.entry(phase_id.clone()).or_default();
        let prior = phase.spent.get(&key.name).copied().unwrap_or_default();
        let mut next = prior + delta;

        let mut warning = None;
        if next < Decimal::ZERO {
            let w = ReconciliationWarning {
                project_id: self.project_id.clone(),
                phase_id: Some(phase_id.clone()),
                department: Some(key.name.clone()),
                attempted_delta: delta,
                prior_spent: prior,
            };
            warn!(warning = %w, "ledger delta clamped; flagging for reconciliation");
            self.warnings.push(w.clone());
            warning = Some(w);
            next = Decimal::ZERO;
        }

        phase.total_spent += next - prior;
        phase.spent.insert(key.name, next);
        warning
    }

    /// Applies a signed delta to the synthetic "Other Expenses" bucket:
    /// anonymous expenses and expenses whose department matches no live
    /// department, tracked as a flat per-project amount with no budget.
    pub fn apply_other_delta(&mut self, delta: Decimal) -> Option<ReconciliationWarning> {
        let prior = self.other_spent;
        let next = prior + delta;
        if next < Decimal::ZERO {
            let w = ReconciliationWarning {
                project_id: self.project_id.clone(),
                phase_id: None,
                department: None,
                attempted_delta: delta,
                prior_spent: prior,
            };
            warn!(warning = %w, "other-expenses delta clamped; flagging for reconciliation");
            self.warnings.push(w.clone());
            self.other_spent = Decimal::ZERO;
            return Some(w);
        }
        self.other_spent = next;
        None
    }

    /// Budget and spent totals for one phase.
    #[must_use]
    pub fn phase_totals(&self, phase_id: &PhaseId) -> Option<Totals> {
        self.phases
            .get(phase_id)
            .map(|p| Totals::new(p.total_budget, p.total_spent))
    }

    /// Budget and spent totals across all phases of the project. The Other
    /// Expenses bucket is excluded: it carries no budget and is reported
    /// separately via [`Self::other_expenses_total`].
    #[must_use]
    pub fn project_totals(&self) -> Totals {
        self.phases
            .values()
            .map(|p| Totals::new(p.total_budget, p.total_spent))
            .fold(Totals::default(), |acc, t| acc + t)
    }

    /// Totals per department name, summed across phases (same-named
    /// departments in different phases merge).
    #[must_use]
    pub fn department_totals_across_phases(&self) -> BTreeMap<String, Totals> {
        let mut out: BTreeMap<String, Totals> = BTreeMap::new();
        for phase in self.phases.values() {
            for (name, budget) in &phase.budgets {
                out.entry(name.clone()).or_default().budget += *budget;
            }
            for (name, spent) in &phase.spent {
                out.entry(name.clone()).or_default().spent += *spent;
            }
        }
        out
    }

    /// Spent recorded against a department, accepting either wire key form.
    #[must_use]
    pub fn department_spent(&self, phase_id: &PhaseId, raw_key: &str) -> Decimal {
        let key = DeptKey::parse_in_phase(raw_key, phase_id);
        self.phases
            .get(phase_id)
            .and_then(|p| p.spent.get(&key.name).copied())
            .unwrap_or_default()
    }

    /// Total of the synthetic Other Expenses bucket.
    #[must_use]
    pub const fn other_expenses_total(&self) -> Decimal {
        self.other_spent
    }

    /// Drains accumulated reconciliation warnings.
    pub fn take_warnings(&mut self) -> Vec<ReconciliationWarning> {
        std::mem::take(&mut self.warnings)
    }
}
