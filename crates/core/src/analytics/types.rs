//! Derived series output types.

use rust_decimal::Decimal;
use serde::Serialize;

use buildtrack_shared::types::{PhaseId, ProjectId};

/// Overrun value plotted for a phase with budget, no spend, and more than
/// a quarter of its schedule elapsed. Distinguishes "no spend recorded"
/// from a genuine 0% overrun on the chart.
pub const NO_SPEND_SENTINEL_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, true, 0);

/// Schedule-progress threshold above which the no-spend sentinel applies.
pub const NO_SPEND_PROGRESS_THRESHOLD: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// One month bucket of the approved-spend trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostTrendPoint {
    /// Month label: `"Jan"`, or `"Jan 2026"` when the range spans years.
    pub label: String,
    /// Approved spend booked in the month.
    pub total: Decimal,
}

/// Budget vs actual for one stage name, merged across projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageBudgetActual {
    /// Stage (phase) name.
    pub stage: String,
    /// Sum of department budgets across phases with this name.
    pub budget: Decimal,
    /// Approved spend booked to those phases.
    pub actual: Decimal,
}

/// Budget vs actual for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectBudgetActual {
    /// The project.
    pub project_id: ProjectId,
    /// Project name, for chart labels.
    pub name: String,
    /// Sum of phase budgets.
    pub budget: Decimal,
    /// Approved spend.
    pub actual: Decimal,
}

/// Approved spend over the trailing 30 wall-clock days, per project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurnRateEntry {
    /// The project.
    pub project_id: ProjectId,
    /// Project name, for chart labels.
    pub name: String,
    /// Trailing-window approved spend; never zero (zero entries are
    /// excluded from the series).
    pub total: Decimal,
}

/// Overrun percentage plotted against schedule progress for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrunPoint {
    /// The phase.
    pub phase_id: PhaseId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Stage name, for chart labels.
    pub stage: String,
    /// Elapsed share of the schedule, clamped to `[0, 100]`.
    pub progress_percent: Decimal,
    /// Spend over budget as a percentage of budget, or
    /// [`NO_SPEND_SENTINEL_PERCENT`].
    pub overrun_percent: Decimal,
}

/// Suspension-reason histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspensionReasonCount {
    /// The trimmed reason text.
    pub reason: String,
    /// Number of suspended projects citing it.
    pub count: usize,
    /// Names of those projects.
    pub projects: Vec<String>,
}

/// Budget-vs-schedule point for a project that overran its estimate or
/// had at least one approved extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayCorrelationPoint {
    /// The project.
    pub project_id: ProjectId,
    /// Project name, for chart labels.
    pub name: String,
    /// Total days of accepted extensions, from the change log.
    pub extended_days: i64,
    /// Sum of phase budgets.
    pub budget: Decimal,
    /// Estimate recorded at signing.
    pub estimated_budget: Decimal,
}

/// The full set of derived series from one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    /// Monthly approved-spend trend, zero-filled over the range.
    pub cost_trend: Vec<CostTrendPoint>,
    /// Stage budget vs actual; empty unless more than one distinct stage
    /// is in scope.
    pub stage_budget_vs_actual: Vec<StageBudgetActual>,
    /// Project budget vs actual; empty unless more than one project is in
    /// scope.
    pub project_budget_vs_actual: Vec<ProjectBudgetActual>,
    /// Trailing-30-day spend per project, descending, zeroes excluded.
    pub burn_rate: Vec<BurnRateEntry>,
    /// Per-phase overrun scatter.
    pub overrun: Vec<OverrunPoint>,
    /// Suspension-reason histogram.
    pub suspension_reasons: Vec<SuspensionReasonCount>,
    /// Delay-vs-budget correlation points.
    pub delay_correlation: Vec<DelayCorrelationPoint>,
}
