//! Wire codec between domain types and document fields.
//!
//! Interop rules the external store imposes:
//! - date fields are `dd/MM/yyyy` strings, except `createdAt`/`updatedAt`
//!   which are store-native timestamps
//! - project statuses are the literal names (`ACTIVE`, `IN_REVIEW`, ...)
//! - department budget keys are written in composite `phaseId_name` form;
//!   legacy bare-name keys are accepted on read
//!
//! Encoders emit the `Delete` sentinel for cleared optional fields, so
//! they are meant for merge writes: merging the full encoding both sets
//! and clears fields in one operation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use buildtrack_shared::types::{
    format_store_date, parse_store_date, ChangeId, CustomerId, DepartmentId, ExpenseId, PhaseId,
    ProjectId, RequestId, UserId,
};

use buildtrack_core::model::{
    Department, DeptKey, Expense, ExpenseStatus, ExtensionRequest, ExtensionStatus,
    HandoverBaseline, Phase, PhaseChange, Project, ProjectStatus,
};

use crate::document::{FieldValue, Fields};
use crate::error::StoreError;

// --- field helpers ----------------------------------------------------

fn opt_string(value: Option<impl Into<String>>) -> FieldValue {
    value.map_or(FieldValue::Delete, |s| FieldValue::String(s.into()))
}

fn opt_date(value: Option<NaiveDate>) -> FieldValue {
    opt_string(value.map(format_store_date))
}

fn opt_timestamp(value: Option<DateTime<Utc>>) -> FieldValue {
    value.map_or(FieldValue::Delete, FieldValue::Timestamp)
}

fn require<'a>(fields: &'a Fields, name: &str, path: &str) -> Result<&'a FieldValue, StoreError> {
    fields
        .get(name)
        .ok_or_else(|| StoreError::decode(path, format!("missing field '{name}'")))
}

fn read_string(fields: &Fields, name: &str, path: &str) -> Result<String, StoreError> {
    require(fields, name, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StoreError::decode(path, format!("field '{name}' is not a string")))
}

fn read_opt_string(fields: &Fields, name: &str, path: &str) -> Result<Option<String>, StoreError> {
    match fields.get(name) {
        // Delete is the encoders' cleared-optional sentinel; a field map
        // that never passed through a merge may still carry it.
        None | Some(FieldValue::Null | FieldValue::Delete) => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| StoreError::decode(path, format!("field '{name}' is not a string"))),
    }
}

fn read_date(fields: &Fields, name: &str, path: &str) -> Result<NaiveDate, StoreError> {
    let raw = read_string(fields, name, path)?;
    parse_store_date(&raw).map_err(|e| StoreError::decode(path, e.to_string()))
}

fn read_opt_date(fields: &Fields, name: &str, path: &str) -> Result<Option<NaiveDate>, StoreError> {
    read_opt_string(fields, name, path)?
        .map(|raw| parse_store_date(&raw).map_err(|e| StoreError::decode(path, e.to_string())))
        .transpose()
}

fn read_decimal(fields: &Fields, name: &str, path: &str) -> Result<Decimal, StoreError> {
    require(fields, name, path)?
        .as_decimal()
        .ok_or_else(|| StoreError::decode(path, format!("field '{name}' is not a number")))
}

fn read_bool_or(fields: &Fields, name: &str, default: bool) -> bool {
    fields
        .get(name)
        .and_then(FieldValue::as_bool)
        .unwrap_or(default)
}

/// Legacy records predate the timestamp fields; absent values decode to
/// the epoch rather than failing the whole document.
fn read_timestamp_or_epoch(fields: &Fields, name: &str) -> DateTime<Utc> {
    fields
        .get(name)
        .and_then(FieldValue::as_timestamp)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn read_opt_timestamp(fields: &Fields, name: &str) -> Option<DateTime<Utc>> {
    fields.get(name).and_then(FieldValue::as_timestamp)
}

// --- project ----------------------------------------------------------

/// Encodes a project for a merge write.
#[must_use]
pub fn encode_project(project: &Project) -> Fields {
    let mut fields = Fields::new();
    fields.insert("customerId".into(), project.customer_id.as_str().into());
    fields.insert("name".into(), project.name.as_str().into());
    fields.insert("status".into(), project.status.as_str().into());
    fields.insert("plannedDate".into(), opt_date(project.planned_date));
    fields.insert("handoverDate".into(), opt_date(project.handover_date));
    fields.insert(
        "initialHandoverDate".into(),
        opt_date(project.handover_baseline.date()),
    );
    fields.insert(
        "initialHandoverInherited".into(),
        match project.handover_baseline {
            HandoverBaseline::Unset => FieldValue::Delete,
            HandoverBaseline::Inherited { .. } => FieldValue::Bool(true),
            HandoverBaseline::Explicit(_) => FieldValue::Bool(false),
        },
    );
    fields.insert("maintenanceDate".into(), opt_date(project.maintenance_date));
    fields.insert("isSuspended".into(), project.is_suspended.into());
    fields.insert("suspendedDate".into(), opt_date(project.suspended_date));
    fields.insert(
        "suspensionReason".into(),
        opt_string(project.suspension_reason.clone()),
    );
    fields.insert(
        "statusBeforeSuspension".into(),
        opt_string(project.status_before_suspension.map(ProjectStatus::as_str)),
    );
    fields.insert(
        "managerId".into(),
        opt_string(project.manager_id.as_ref().map(|id| id.as_str().to_string())),
    );
    fields.insert(
        "teamMemberIds".into(),
        FieldValue::Array(
            project
                .team_member_ids
                .iter()
                .map(|id| id.as_str().into())
                .collect(),
        ),
    );
    fields.insert(
        "tempApproverId".into(),
        opt_string(
            project
                .temp_approver_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
        ),
    );
    fields.insert("estimatedBudget".into(), project.estimated_budget.into());
    fields.insert("createdAt".into(), project.created_at.into());
    fields.insert("updatedAt".into(), project.updated_at.into());
    fields
}

/// Decodes a project document.
pub fn decode_project(id: &str, fields: &Fields, path: &str) -> Result<Project, StoreError> {
    let status_raw = read_string(fields, "status", path)?;
    let status = ProjectStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::decode(path, format!("unknown status '{status_raw}'")))?;

    let baseline_date = read_opt_date(fields, "initialHandoverDate", path)?;
    let handover_baseline = match baseline_date {
        None => HandoverBaseline::Unset,
        Some(date) => {
            // Legacy records carry only the date; treat those as inherited,
            // which is what the old mirroring behavior produced.
            if read_bool_or(fields, "initialHandoverInherited", true) {
                HandoverBaseline::Inherited { from: date }
            } else {
                HandoverBaseline::Explicit(date)
            }
        }
    };

    let status_before_suspension = read_opt_string(fields, "statusBeforeSuspension", path)?
        .map(|raw| {
            ProjectStatus::parse(&raw)
                .ok_or_else(|| StoreError::decode(path, format!("unknown status '{raw}'")))
        })
        .transpose()?;

    let team_member_ids: BTreeSet<UserId> = fields
        .get("teamMemberIds")
        .and_then(FieldValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(FieldValue::as_str)
                .map(UserId::from)
                .collect()
        })
        .unwrap_or_default();

    Ok(Project {
        id: ProjectId::from(id),
        customer_id: CustomerId::from(read_string(fields, "customerId", path)?),
        name: read_string(fields, "name", path)?,
        status,
        planned_date: read_opt_date(fields, "plannedDate", path)?,
        handover_date: read_opt_date(fields, "handoverDate", path)?,
        handover_baseline,
        maintenance_date: read_opt_date(fields, "maintenanceDate", path)?,
        is_suspended: read_bool_or(fields, "isSuspended", false),
        suspended_date: read_opt_date(fields, "suspendedDate", path)?,
        suspension_reason: read_opt_string(fields, "suspensionReason", path)?,
        status_before_suspension,
        manager_id: read_opt_string(fields, "managerId", path)?.map(UserId::from),
        team_member_ids,
        temp_approver_id: read_opt_string(fields, "tempApproverId", path)?.map(UserId::from),
        estimated_budget: fields
            .get("estimatedBudget")
            .and_then(FieldValue::as_decimal)
            .unwrap_or_default(),
        created_at: read_timestamp_or_epoch(fields, "createdAt"),
        updated_at: read_timestamp_or_epoch(fields, "updatedAt"),
    })
}

// --- phase ------------------------------------------------------------

/// Encodes a phase for a merge write. Department budget keys are written
/// in composite form.
#[must_use]
pub fn encode_phase(phase: &Phase) -> Fields {
    let budgets: Fields = phase
        .department_budgets
        .iter()
        .map(|(name, amount)| {
            (
                DeptKey::new(phase.id.clone(), name.as_str()).composite(),
                FieldValue::Decimal(*amount),
            )
        })
        .collect();

    let mut fields = Fields::new();
    fields.insert("name".into(), phase.name.as_str().into());
    fields.insert("sequence".into(), i64::from(phase.sequence).into());
    fields.insert("startDate".into(), opt_date(phase.start_date));
    fields.insert("endDate".into(), opt_date(phase.end_date));
    fields.insert("departmentBudgets".into(), FieldValue::Map(budgets));
    fields.insert("createdAt".into(), phase.created_at.into());
    fields
}

/// Decodes a phase document. Budget keys in either composite or legacy
/// bare form resolve to the same department.
pub fn decode_phase(
    id: &str,
    project_id: &ProjectId,
    fields: &Fields,
    path: &str,
) -> Result<Phase, StoreError> {
    let phase_id = PhaseId::from(id);
    let mut department_budgets = BTreeMap::new();
    if let Some(raw_budgets) = fields.get("departmentBudgets") {
        let map = raw_budgets
            .as_map()
            .ok_or_else(|| StoreError::decode(path, "field 'departmentBudgets' is not a map"))?;
        for (raw_key, value) in map {
            let amount = value.as_decimal().ok_or_else(|| {
                StoreError::decode(path, format!("budget '{raw_key}' is not a number"))
            })?;
            let key = DeptKey::parse_in_phase(raw_key, &phase_id);
            department_budgets.insert(key.name, amount);
        }
    }

    let sequence = fields
        .get("sequence")
        .and_then(FieldValue::as_int)
        .unwrap_or_default();

    Ok(Phase {
        id: phase_id,
        project_id: project_id.clone(),
        name: read_string(fields, "name", path)?,
        sequence: u32::try_from(sequence)
            .map_err(|_| StoreError::decode(path, format!("invalid sequence {sequence}")))?,
        start_date: read_opt_date(fields, "startDate", path)?,
        end_date: read_opt_date(fields, "endDate", path)?,
        department_budgets,
        created_at: read_timestamp_or_epoch(fields, "createdAt"),
    })
}

// --- department -------------------------------------------------------

/// Encodes a department document.
#[must_use]
pub fn encode_department(department: &Department) -> Fields {
    let mut fields = Fields::new();
    fields.insert("phaseId".into(), department.phase_id.as_str().into());
    fields.insert("name".into(), department.name.as_str().into());
    fields.insert("totalBudget".into(), department.total_budget.into());
    fields.insert("isContractor".into(), department.is_contractor.into());
    fields
}

/// Decodes a department document.
pub fn decode_department(id: &str, fields: &Fields, path: &str) -> Result<Department, StoreError> {
    Ok(Department {
        id: DepartmentId::from(id),
        phase_id: PhaseId::from(read_string(fields, "phaseId", path)?),
        name: read_string(fields, "name", path)?,
        total_budget: read_decimal(fields, "totalBudget", path)?,
        is_contractor: read_bool_or(fields, "isContractor", false),
    })
}

// --- expense ----------------------------------------------------------

/// Encodes an expense for a merge write. The department key is written in
/// composite form when the expense is booked to a phase.
#[must_use]
pub fn encode_expense(expense: &Expense) -> Fields {
    let department = match &expense.phase_id {
        Some(phase_id) => DeptKey::parse_in_phase(&expense.department, phase_id).composite(),
        None => expense.department.clone(),
    };

    let mut fields = Fields::new();
    fields.insert(
        "phaseId".into(),
        opt_string(expense.phase_id.as_ref().map(|id| id.as_str().to_string())),
    );
    fields.insert("department".into(), department.into());
    fields.insert("amount".into(), expense.amount.into());
    fields.insert("status".into(), expense.status.as_str().into());
    fields.insert("isAnonymous".into(), expense.is_anonymous.into());
    fields.insert("date".into(), format_store_date(expense.business_date).into());
    fields.insert(
        "submittedBy".into(),
        opt_string(
            expense
                .submitted_by
                .as_ref()
                .map(|id| id.as_str().to_string()),
        ),
    );
    fields.insert("createdAt".into(), expense.created_at.into());
    fields.insert("decidedAt".into(), opt_timestamp(expense.decided_at));
    fields.insert(
        "decidedBy".into(),
        opt_string(expense.decided_by.as_ref().map(|id| id.as_str().to_string())),
    );
    fields
}

/// Decodes an expense document.
pub fn decode_expense(
    id: &str,
    project_id: &ProjectId,
    fields: &Fields,
    path: &str,
) -> Result<Expense, StoreError> {
    let status_raw = read_string(fields, "status", path)?;
    let status = ExpenseStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::decode(path, format!("unknown status '{status_raw}'")))?;

    Ok(Expense {
        id: ExpenseId::from(id),
        project_id: project_id.clone(),
        phase_id: read_opt_string(fields, "phaseId", path)?.map(PhaseId::from),
        department: read_string(fields, "department", path)?,
        amount: read_decimal(fields, "amount", path)?,
        status,
        is_anonymous: read_bool_or(fields, "isAnonymous", false),
        business_date: read_date(fields, "date", path)?,
        submitted_by: read_opt_string(fields, "submittedBy", path)?.map(UserId::from),
        created_at: read_timestamp_or_epoch(fields, "createdAt"),
        decided_at: read_opt_timestamp(fields, "decidedAt"),
        decided_by: read_opt_string(fields, "decidedBy", path)?.map(UserId::from),
    })
}

// --- extension requests and change log --------------------------------

const fn extension_status_str(status: ExtensionStatus) -> &'static str {
    match status {
        ExtensionStatus::Pending => "pending",
        ExtensionStatus::Approved => "approved",
        ExtensionStatus::Rejected => "rejected",
    }
}

fn parse_extension_status(raw: &str, path: &str) -> Result<ExtensionStatus, StoreError> {
    match raw {
        "pending" => Ok(ExtensionStatus::Pending),
        "approved" => Ok(ExtensionStatus::Approved),
        "rejected" => Ok(ExtensionStatus::Rejected),
        other => Err(StoreError::decode(
            path,
            format!("unknown extension status '{other}'"),
        )),
    }
}

/// Encodes an extension request.
#[must_use]
pub fn encode_request(request: &ExtensionRequest) -> Fields {
    let mut fields = Fields::new();
    fields.insert("phaseId".into(), request.phase_id.as_str().into());
    fields.insert(
        "requestedEndDate".into(),
        format_store_date(request.requested_end_date).into(),
    );
    fields.insert("status".into(), extension_status_str(request.status).into());
    fields.insert("createdAt".into(), request.created_at.into());
    fields
}

/// Decodes an extension request document.
pub fn decode_request(id: &str, fields: &Fields, path: &str) -> Result<ExtensionRequest, StoreError> {
    Ok(ExtensionRequest {
        id: RequestId::from(id),
        phase_id: PhaseId::from(read_string(fields, "phaseId", path)?),
        requested_end_date: read_date(fields, "requestedEndDate", path)?,
        status: parse_extension_status(&read_string(fields, "status", path)?, path)?,
        created_at: read_timestamp_or_epoch(fields, "createdAt"),
    })
}

/// Encodes a change-log entry.
#[must_use]
pub fn encode_change(change: &PhaseChange) -> Fields {
    let mut fields = Fields::new();
    fields.insert("requestId".into(), change.request_id.as_str().into());
    fields.insert("phaseId".into(), change.phase_id.as_str().into());
    fields.insert(
        "previousEndDate".into(),
        format_store_date(change.previous_end_date).into(),
    );
    fields.insert(
        "newEndDate".into(),
        format_store_date(change.new_end_date).into(),
    );
    fields.insert("recordedAt".into(), change.recorded_at.into());
    fields
}

/// Decodes a change-log entry.
pub fn decode_change(id: &str, fields: &Fields, path: &str) -> Result<PhaseChange, StoreError> {
    Ok(PhaseChange {
        id: ChangeId::from(id),
        request_id: RequestId::from(read_string(fields, "requestId", path)?),
        phase_id: PhaseId::from(read_string(fields, "phaseId", path)?),
        previous_end_date: read_date(fields, "previousEndDate", path)?,
        new_end_date: read_date(fields, "newEndDate", path)?,
        recorded_at: read_timestamp_or_epoch(fields, "recordedAt"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_project_dates_encode_as_store_strings() {
        let mut project = Project::new(CustomerId::from("c1"), "Plant A");
        project.planned_date = Some(d(2026, 3, 7));
        project.status = ProjectStatus::InReview;

        let fields = encode_project(&project);
        assert_eq!(
            fields["plannedDate"].as_str(),
            Some("07/03/2026"),
            "dates must use dd/MM/yyyy"
        );
        assert_eq!(fields["status"].as_str(), Some("IN_REVIEW"));
        // Cleared optionals merge as deletes.
        assert_eq!(fields["handoverDate"], FieldValue::Delete);
    }

    #[test]
    fn test_project_round_trip_preserves_baseline() {
        let mut project = Project::new(CustomerId::from("c1"), "Plant A");
        project.handover_date = Some(d(2026, 9, 1));
        project.handover_baseline = HandoverBaseline::Inherited { from: d(2026, 9, 1) };

        let mut fields = encode_project(&project);
        fields.retain(|_, v| *v != FieldValue::Delete);
        let decoded = decode_project("p1", &fields, "test").unwrap();
        assert_eq!(decoded.handover_baseline, project.handover_baseline);
        assert_eq!(decoded.handover_date, project.handover_date);
    }

    #[test]
    fn test_legacy_baseline_without_flag_reads_as_inherited() {
        let project = Project::new(CustomerId::from("c1"), "Plant A");
        let mut fields = encode_project(&project);
        fields.retain(|_, v| *v != FieldValue::Delete);
        fields.insert("initialHandoverDate".into(), "15/06/2026".into());

        let decoded = decode_project("p1", &fields, "test").unwrap();
        assert_eq!(
            decoded.handover_baseline,
            HandoverBaseline::Inherited { from: d(2026, 6, 15) }
        );
    }

    #[test]
    fn test_phase_budgets_write_composite_and_read_both_forms() {
        let mut phase = Phase {
            id: PhaseId::from("ph1"),
            project_id: ProjectId::from("p1"),
            name: "Foundation".to_string(),
            sequence: 1,
            start_date: Some(d(2026, 1, 10)),
            end_date: None,
            department_budgets: BTreeMap::new(),
            created_at: Utc::now(),
        };
        phase
            .department_budgets
            .insert("Civil".to_string(), dec!(50_000));

        let fields = encode_phase(&phase);
        let budgets = fields["departmentBudgets"].as_map().unwrap();
        assert!(budgets.contains_key("ph1_Civil"), "write uses composite keys");

        // A legacy record with a bare key decodes to the same department.
        let mut legacy = fields.clone();
        let mut legacy_budgets = Fields::new();
        legacy_budgets.insert("Civil".into(), FieldValue::Decimal(dec!(50_000)));
        legacy.insert("departmentBudgets".into(), FieldValue::Map(legacy_budgets));

        let from_composite =
            decode_phase("ph1", &ProjectId::from("p1"), &fields, "test").unwrap();
        let from_bare = decode_phase("ph1", &ProjectId::from("p1"), &legacy, "test").unwrap();
        assert_eq!(
            from_composite.department_budgets,
            from_bare.department_budgets
        );
        assert_eq!(from_composite.department_budgets["Civil"], dec!(50_000));
    }

    #[test]
    fn test_expense_round_trip() {
        let expense = Expense {
            id: ExpenseId::from("e1"),
            project_id: ProjectId::from("p1"),
            phase_id: Some(PhaseId::from("ph1")),
            department: "Civil".to_string(),
            amount: dec!(1234.56),
            status: ExpenseStatus::Pending,
            is_anonymous: false,
            business_date: d(2026, 4, 2),
            submitted_by: Some(UserId::from("u1")),
            created_at: Utc::now(),
            decided_at: None,
            decided_by: None,
        };

        let mut fields = encode_expense(&expense);
        assert_eq!(fields["department"].as_str(), Some("ph1_Civil"));
        assert_eq!(fields["date"].as_str(), Some("02/04/2026"));
        assert_eq!(fields["status"].as_str(), Some("pending"));

        fields.retain(|_, v| *v != FieldValue::Delete);
        let decoded = decode_expense("e1", &ProjectId::from("p1"), &fields, "test").unwrap();
        assert_eq!(decoded.amount, expense.amount);
        assert_eq!(decoded.business_date, expense.business_date);
        assert_eq!(decoded.department, "ph1_Civil");
    }

    #[test]
    fn test_fresh_encoding_decodes_without_a_merge_pass() {
        // Encoders emit Delete for cleared optionals; decoding must treat
        // those sentinels as absent rather than as malformed fields.
        let project = Project::new(CustomerId::from("c1"), "Plant A");
        let decoded = decode_project("p1", &encode_project(&project), "test").unwrap();
        assert_eq!(decoded.planned_date, None);
        assert_eq!(decoded.handover_date, None);
        assert_eq!(decoded.suspension_reason, None);
    }

    #[test]
    fn test_decode_rejects_unknown_status() {
        let mut fields = Fields::new();
        fields.insert("customerId".into(), "c1".into());
        fields.insert("name".into(), "Plant A".into());
        fields.insert("status".into(), "PAUSED".into());
        let err = decode_project("p1", &fields, "customers/c1/projects/p1").unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }
}
