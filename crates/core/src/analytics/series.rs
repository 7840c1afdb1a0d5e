//! Pure series computations over a snapshot.
//!
//! Every function here is deterministic in (snapshot, filter, today), so
//! the full report can be computed in parallel and the engine can discard
//! stale results safely.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;

use buildtrack_shared::types::{months_after, spans_years};

use crate::model::{DeptKey, Expense, ExtensionRequest, Phase, PhaseChange, Project};

use super::filter::AnalyticsFilter;
use super::snapshot::{AnalyticsSnapshot, ProjectData};
use super::types::{
    AnalyticsReport, BurnRateEntry, CostTrendPoint, DelayCorrelationPoint, OverrunPoint,
    ProjectBudgetActual, StageBudgetActual, SuspensionReasonCount, NO_SPEND_PROGRESS_THRESHOLD,
    NO_SPEND_SENTINEL_PERCENT,
};

/// Wall-clock window the burn-rate series looks back over, in days.
const BURN_RATE_WINDOW_DAYS: u64 = 30;

/// A project admitted by the filter, with its stage-filtered phases.
struct Scoped<'a> {
    project: &'a Project,
    data: &'a ProjectData,
    phases: Vec<&'a Phase>,
}

impl Scoped<'_> {
    /// Bare department name of an expense, resolved against its phase.
    fn bare_department(expense: &Expense) -> String {
        match &expense.phase_id {
            Some(phase_id) => DeptKey::parse_in_phase(&expense.department, phase_id).name,
            None => expense.department.clone(),
        }
    }

    /// True when an approved expense passes the stage and department
    /// dimensions. Phaseless expenses only pass while no stage filter is
    /// active.
    fn expense_in_scope(&self, filter: &AnalyticsFilter, expense: &Expense) -> bool {
        if !expense.is_approved() {
            return false;
        }
        match &expense.phase_id {
            Some(phase_id) => {
                if !self.phases.iter().any(|p| p.id == *phase_id) {
                    return false;
                }
            }
            None => {
                if filter.stage_names.is_some() {
                    return false;
                }
            }
        }
        filter.matches_department(&Self::bare_department(expense))
    }

    /// Approved, in-scope expenses with a business date inside the range.
    fn ranged_expenses<'b>(
        &'b self,
        filter: &'b AnalyticsFilter,
    ) -> impl Iterator<Item = &'b Expense> {
        self.data
            .expenses
            .iter()
            .filter(move |e| {
                self.expense_in_scope(filter, e) && filter.date_range.contains(e.business_date)
            })
    }

    /// Phase budget restricted to departments passing the filter.
    fn phase_budget(filter: &AnalyticsFilter, phase: &Phase) -> Decimal {
        phase
            .department_budgets
            .iter()
            .filter(|(name, _)| filter.matches_department(name))
            .map(|(_, budget)| *budget)
            .sum()
    }
}

fn scope<'a>(snapshot: &'a AnalyticsSnapshot, filter: &AnalyticsFilter) -> Vec<Scoped<'a>> {
    snapshot
        .projects
        .iter()
        .filter(|(project, _)| filter.matches_project(project))
        .map(|(project, data)| Scoped {
            project,
            data,
            phases: data
                .phases
                .iter()
                .filter(|phase| filter.matches_stage(&phase.name))
                .collect(),
        })
        .collect()
}

/// Monthly approved-spend trend over the filter's date range.
///
/// Every month in the range gets a bucket, zero-filled when nothing was
/// spent. Labels carry the year only when the range spans calendar years.
#[must_use]
pub fn cost_trend(snapshot: &AnalyticsSnapshot, filter: &AnalyticsFilter) -> Vec<CostTrendPoint> {
    let mut buckets: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for scoped in scope(snapshot, filter) {
        for expense in scoped.ranged_expenses(filter) {
            let key = (expense.business_date.year(), expense.business_date.month());
            *buckets.entry(key).or_default() += expense.amount;
        }
    }

    let with_year = spans_years(filter.date_range.start, filter.date_range.end);
    let label_format = if with_year { "%b %Y" } else { "%b" };

    let mut points = Vec::new();
    let mut month = first_of_month(filter.date_range.start);
    let last = first_of_month(filter.date_range.end);
    while month <= last {
        let total = buckets
            .get(&(month.year(), month.month()))
            .copied()
            .unwrap_or_default();
        points.push(CostTrendPoint {
            label: month.format(label_format).to_string(),
            total,
        });
        month = months_after(month, 1);
    }
    points
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    // day 1 always exists
    date.with_day(1).unwrap_or(date)
}

/// Budget vs actual per stage name, merged across projects.
///
/// A comparison needs something to compare against, so the series is
/// empty unless more than one distinct stage name is in scope.
#[must_use]
pub fn stage_budget_vs_actual(
    snapshot: &AnalyticsSnapshot,
    filter: &AnalyticsFilter,
) -> Vec<StageBudgetActual> {
    let mut by_stage: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for scoped in scope(snapshot, filter) {
        for phase in &scoped.phases {
            let entry = by_stage.entry(phase.name.clone()).or_default();
            entry.0 += Scoped::phase_budget(filter, phase);
        }
        for expense in scoped.ranged_expenses(filter) {
            let Some(phase_id) = &expense.phase_id else {
                continue;
            };
            if let Some(phase) = scoped.phases.iter().find(|p| p.id == *phase_id)
                && let Some(entry) = by_stage.get_mut(&phase.name)
            {
                entry.1 += expense.amount;
            }
        }
    }

    if by_stage.len() <= 1 {
        return Vec::new();
    }
    by_stage
        .into_iter()
        .map(|(stage, (budget, actual))| StageBudgetActual {
            stage,
            budget,
            actual,
        })
        .collect()
}

/// Budget vs actual per project; empty unless more than one project is in
/// scope.
#[must_use]
pub fn project_budget_vs_actual(
    snapshot: &AnalyticsSnapshot,
    filter: &AnalyticsFilter,
) -> Vec<ProjectBudgetActual> {
    let scoped = scope(snapshot, filter);
    if scoped.len() <= 1 {
        return Vec::new();
    }
    scoped
        .iter()
        .map(|s| ProjectBudgetActual {
            project_id: s.project.id.clone(),
            name: s.project.name.clone(),
            budget: s
                .phases
                .iter()
                .map(|phase| Scoped::phase_budget(filter, phase))
                .sum(),
            actual: s.ranged_expenses(filter).map(|e| e.amount).sum(),
        })
        .collect()
}

/// Approved spend over the trailing 30 wall-clock days per project,
/// descending by total.
///
/// The window is anchored at `today`, not at the filter's date range, so
/// the series stays a live health signal whatever period is being viewed.
/// Projects with zero trailing spend are excluded.
#[must_use]
pub fn burn_rate(
    snapshot: &AnalyticsSnapshot,
    filter: &AnalyticsFilter,
    today: NaiveDate,
) -> Vec<BurnRateEntry> {
    let window_start = today - Days::new(BURN_RATE_WINDOW_DAYS);
    let mut entries: Vec<BurnRateEntry> = scope(snapshot, filter)
        .iter()
        .filter_map(|scoped| {
            let total: Decimal = scoped
                .data
                .expenses
                .iter()
                .filter(|e| {
                    scoped.expense_in_scope(filter, e)
                        && e.business_date > window_start
                        && e.business_date <= today
                })
                .map(|e| e.amount)
                .sum();
            (total > Decimal::ZERO).then(|| BurnRateEntry {
                project_id: scoped.project.id.clone(),
                name: scoped.project.name.clone(),
                total,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    entries
}

/// Per-phase overrun scatter: spend over budget against schedule progress.
///
/// Progress is clamped to `[0, 100]`. Phases without a budget or a usable
/// date range are skipped, and only phases actually over budget plot a
/// point, with one exception: a budgeted phase with no spend past a
/// quarter of its schedule plots the no-spend sentinel to flag spend that
/// is expected but absent.
#[must_use]
pub fn overrun(
    snapshot: &AnalyticsSnapshot,
    filter: &AnalyticsFilter,
    today: NaiveDate,
) -> Vec<OverrunPoint> {
    let mut points = Vec::new();
    for scoped in scope(snapshot, filter) {
        for phase in &scoped.phases {
            let (Some(start), Some(end)) = (phase.start_date, phase.end_date) else {
                continue;
            };
            let total_days = (end - start).num_days();
            if total_days <= 0 {
                continue;
            }
            let budget = Scoped::phase_budget(filter, phase);
            if budget <= Decimal::ZERO {
                continue;
            }

            let elapsed = (today - start).num_days();
            let progress = (Decimal::from(elapsed) / Decimal::from(total_days)
                * Decimal::ONE_HUNDRED)
                .round_dp(1)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

            let actual: Decimal = scoped
                .ranged_expenses(filter)
                .filter(|e| e.phase_id.as_ref() == Some(&phase.id))
                .map(|e| e.amount)
                .sum();

            let overrun_percent = if actual == Decimal::ZERO {
                if progress <= NO_SPEND_PROGRESS_THRESHOLD {
                    continue;
                }
                NO_SPEND_SENTINEL_PERCENT
            } else {
                let percent = ((actual - budget) / budget * Decimal::ONE_HUNDRED).round_dp(2);
                if percent <= Decimal::ZERO {
                    continue;
                }
                percent
            };

            points.push(OverrunPoint {
                phase_id: phase.id.clone(),
                project_id: scoped.project.id.clone(),
                stage: phase.name.clone(),
                progress_percent: progress,
                overrun_percent,
            });
        }
    }
    points
}

/// Histogram of trimmed suspension reasons across suspended projects.
#[must_use]
pub fn suspension_reasons(
    snapshot: &AnalyticsSnapshot,
    filter: &AnalyticsFilter,
) -> Vec<SuspensionReasonCount> {
    let mut by_reason: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for scoped in scope(snapshot, filter) {
        if !scoped.project.is_suspended {
            continue;
        }
        let Some(reason) = scoped
            .project
            .suspension_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        else {
            continue;
        };
        by_reason
            .entry(reason.to_string())
            .or_default()
            .push(scoped.project.name.clone());
    }
    by_reason
        .into_iter()
        .map(|(reason, projects)| SuspensionReasonCount {
            reason,
            count: projects.len(),
            projects,
        })
        .collect()
}

/// Projects whose phase budgets exceed the signing estimate, or that had
/// at least one accepted extension, with total extended days from the
/// change log.
///
/// Uses the project's full phase set: the correlation compares whole
/// projects against their estimates, so the stage and department filters
/// do not narrow it.
#[must_use]
pub fn delay_correlation(
    snapshot: &AnalyticsSnapshot,
    filter: &AnalyticsFilter,
) -> Vec<DelayCorrelationPoint> {
    scope(snapshot, filter)
        .iter()
        .filter_map(|scoped| {
            let budget: Decimal = scoped.data.phases.iter().map(Phase::total_budget).sum();
            let extended_days: i64 = scoped.data.changes.iter().map(PhaseChange::extended_days).sum();
            let over_estimate = scoped.project.estimated_budget > Decimal::ZERO
                && budget > scoped.project.estimated_budget;
            // Inclusion tests the extensions themselves, not the day sum:
            // an accepted request can net zero or negative days and the
            // project still belongs on the chart.
            let extended = scoped
                .data
                .extensions
                .iter()
                .any(ExtensionRequest::is_approved);
            (over_estimate || extended).then(|| DelayCorrelationPoint {
                project_id: scoped.project.id.clone(),
                name: scoped.project.name.clone(),
                extended_days,
                budget,
                estimated_budget: scoped.project.estimated_budget,
            })
        })
        .collect()
}

/// Computes the full report, fanning the independent series out across
/// the rayon pool.
#[must_use]
pub fn compute_report(
    snapshot: &AnalyticsSnapshot,
    filter: &AnalyticsFilter,
    today: NaiveDate,
) -> AnalyticsReport {
    let ((cost_trend, stage_budget_vs_actual), (project_budget_vs_actual, burn_rate)) =
        rayon::join(
            || {
                rayon::join(
                    || cost_trend(snapshot, filter),
                    || stage_budget_vs_actual(snapshot, filter),
                )
            },
            || {
                rayon::join(
                    || project_budget_vs_actual(snapshot, filter),
                    || burn_rate(snapshot, filter, today),
                )
            },
        );
    let ((overrun, suspension_reasons), delay_correlation) = rayon::join(
        || {
            rayon::join(
                || overrun(snapshot, filter, today),
                || suspension_reasons(snapshot, filter),
            )
        },
        || delay_correlation(snapshot, filter),
    );

    AnalyticsReport {
        cost_trend,
        stage_budget_vs_actual,
        project_budget_vs_actual,
        burn_rate,
        overrun,
        suspension_reasons,
        delay_correlation,
    }
}
