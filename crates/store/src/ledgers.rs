//! Per-project ledger registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use buildtrack_shared::types::ProjectId;

use buildtrack_core::ledger::BudgetLedger;
use buildtrack_core::model::DeptKey;
use buildtrack_core::sync::Published;

use crate::codec;
use crate::error::StoreError;
use crate::paths;
use crate::store::DocumentStore;

/// Registry of live [`BudgetLedger`]s, one per project, cold-loaded from
/// the store on first use.
///
/// After the cold load every mutation moves the ledger by signed deltas;
/// the registry is never re-derived from the expense set unless evicted.
/// Each ledger sits in a [`Published`] cell: writers (serialized by the
/// project's writer lock) build a mutated copy and swap it in, so readers
/// snapshot totals without blocking and never observe a half-applied
/// mutation.
pub struct ProjectLedgers {
    ledgers: DashMap<ProjectId, Arc<Published<BudgetLedger>>>,
}

impl ProjectLedgers {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ledgers: DashMap::new(),
        }
    }

    /// Ensures the project's ledger is loaded, cold-loading from stored
    /// phases and approved expenses on first access.
    pub async fn ensure_loaded(
        &self,
        store: &dyn DocumentStore,
        customer_id: &str,
        project_id: &ProjectId,
    ) -> Result<(), StoreError> {
        if self.ledgers.contains_key(project_id) {
            return Ok(());
        }
        let ledger = load_ledger(store, customer_id, project_id).await?;
        debug!(project = %project_id, "ledger cold-loaded");
        self.ledgers
            .insert(project_id.clone(), Arc::new(Published::new(ledger)));
        Ok(())
    }

    /// Runs `f` against a mutable copy of the project's ledger and
    /// publishes the result. Returns `None` when the ledger has not been
    /// loaded. Callers must hold the project's writer lock.
    pub fn with<R>(
        &self,
        project_id: &ProjectId,
        f: impl FnOnce(&mut BudgetLedger) -> R,
    ) -> Option<R> {
        let cell = self
            .ledgers
            .get(project_id)
            .map(|entry| Arc::clone(entry.value()))?;
        let mut next = (*cell.load()).clone();
        let out = f(&mut next);
        cell.store(next);
        Some(out)
    }

    /// Runs `f` against a read snapshot of the project's ledger. Returns
    /// `None` when the ledger has not been loaded.
    pub fn read<R>(
        &self,
        project_id: &ProjectId,
        f: impl FnOnce(&BudgetLedger) -> R,
    ) -> Option<R> {
        let snapshot = self.ledgers.get(project_id).map(|entry| entry.load())?;
        Some(f(&snapshot))
    }

    /// Drops the project's ledger; the next access cold-loads again.
    pub fn evict(&self, project_id: &ProjectId) {
        self.ledgers.remove(project_id);
    }
}

impl Default for ProjectLedgers {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives a project's ledger from its stored phases and expense set.
/// This is the only place spent totals are derived rather than moved by
/// deltas.
async fn load_ledger(
    store: &dyn DocumentStore,
    customer_id: &str,
    project_id: &ProjectId,
) -> Result<BudgetLedger, StoreError> {
    let mut ledger = BudgetLedger::new(project_id.clone());

    let phases_path = paths::phases(customer_id, project_id);
    let mut phases = Vec::new();
    for doc in store.list(&phases_path).await? {
        let path = format!("{phases_path}/{}", doc.id);
        phases.push(codec::decode_phase(&doc.id, project_id, &doc.fields, &path)?);
    }

    let expenses_path = paths::expenses(customer_id, project_id);
    let mut expenses = Vec::new();
    for doc in store.list(&expenses_path).await? {
        let path = format!("{expenses_path}/{}", doc.id);
        expenses.push(codec::decode_expense(&doc.id, project_id, &doc.fields, &path)?);
    }

    for phase in &phases {
        let mut approved_spent: BTreeMap<String, Decimal> = BTreeMap::new();
        for expense in &expenses {
            if !expense.is_approved()
                || expense.is_anonymous
                || expense.phase_id.as_ref() != Some(&phase.id)
            {
                continue;
            }
            let key = DeptKey::parse_in_phase(&expense.department, &phase.id);
            if phase.department_budgets.contains_key(&key.name) {
                *approved_spent.entry(key.name).or_default() += expense.amount;
            }
        }
        ledger.load_phase(
            phase.id.clone(),
            phase.department_budgets.clone(),
            approved_spent,
        );
    }

    // Everything approved that did not land in a live department flows
    // into the Other Expenses bucket.
    for expense in &expenses {
        if !expense.is_approved() {
            continue;
        }
        let matched = !expense.is_anonymous
            && expense.phase_id.as_ref().is_some_and(|phase_id| {
                ledger.has_department(phase_id, &expense.department)
            });
        if !matched {
            ledger.apply_other_delta(expense.amount);
        }
    }

    Ok(ledger)
}
