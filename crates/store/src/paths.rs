//! Collection path layout.
//!
//! Everything is scoped under a customer workspace. Departments,
//! extension requests, and change-log entries live under their phase;
//! expenses are a flat per-project collection.

use buildtrack_shared::types::{
    ChangeId, DepartmentId, ExpenseId, PhaseId, ProjectId, RequestId,
};

/// Collection of all projects of a customer.
#[must_use]
pub fn projects(customer_id: &str) -> String {
    format!("customers/{customer_id}/projects")
}

/// One project document.
#[must_use]
pub fn project(customer_id: &str, project_id: &ProjectId) -> String {
    format!("customers/{customer_id}/projects/{project_id}")
}

/// Collection of a project's phases.
#[must_use]
pub fn phases(customer_id: &str, project_id: &ProjectId) -> String {
    format!("{}/phases", project(customer_id, project_id))
}

/// One phase document.
#[must_use]
pub fn phase(customer_id: &str, project_id: &ProjectId, phase_id: &PhaseId) -> String {
    format!("{}/{phase_id}", phases(customer_id, project_id))
}

/// Collection of a phase's department documents.
#[must_use]
pub fn departments(customer_id: &str, project_id: &ProjectId, phase_id: &PhaseId) -> String {
    format!("{}/departments", phase(customer_id, project_id, phase_id))
}

/// One department document.
#[must_use]
pub fn department(
    customer_id: &str,
    project_id: &ProjectId,
    phase_id: &PhaseId,
    department_id: &DepartmentId,
) -> String {
    format!(
        "{}/{department_id}",
        departments(customer_id, project_id, phase_id)
    )
}

/// Collection of a project's expenses.
#[must_use]
pub fn expenses(customer_id: &str, project_id: &ProjectId) -> String {
    format!("{}/expenses", project(customer_id, project_id))
}

/// One expense document.
#[must_use]
pub fn expense(customer_id: &str, project_id: &ProjectId, expense_id: &ExpenseId) -> String {
    format!("{}/{expense_id}", expenses(customer_id, project_id))
}

/// Collection of a phase's extension requests.
#[must_use]
pub fn requests(customer_id: &str, project_id: &ProjectId, phase_id: &PhaseId) -> String {
    format!("{}/requests", phase(customer_id, project_id, phase_id))
}

/// One extension request document.
#[must_use]
pub fn request(
    customer_id: &str,
    project_id: &ProjectId,
    phase_id: &PhaseId,
    request_id: &RequestId,
) -> String {
    format!(
        "{}/{request_id}",
        requests(customer_id, project_id, phase_id)
    )
}

/// Collection of a phase's extension change-log entries. Append-only.
#[must_use]
pub fn changes(customer_id: &str, project_id: &ProjectId, phase_id: &PhaseId) -> String {
    format!("{}/changes", phase(customer_id, project_id, phase_id))
}

/// One change-log entry.
#[must_use]
pub fn change(
    customer_id: &str,
    project_id: &ProjectId,
    phase_id: &PhaseId,
    change_id: &ChangeId,
) -> String {
    format!("{}/{change_id}", changes(customer_id, project_id, phase_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_nest_under_customer_and_project() {
        let project_id = ProjectId::from("p1");
        assert_eq!(projects("c1"), "customers/c1/projects");
        assert_eq!(
            phase("c1", &project_id, &PhaseId::from("ph1")),
            "customers/c1/projects/p1/phases/ph1"
        );
        assert_eq!(
            expense("c1", &project_id, &ExpenseId::from("e1")),
            "customers/c1/projects/p1/expenses/e1"
        );
    }

    #[test]
    fn test_departments_requests_and_changes_nest_under_their_phase() {
        let project_id = ProjectId::from("p1");
        let phase_id = PhaseId::from("ph1");
        assert_eq!(
            department("c1", &project_id, &phase_id, &DepartmentId::from("ph1_Civil")),
            "customers/c1/projects/p1/phases/ph1/departments/ph1_Civil"
        );
        assert_eq!(
            request("c1", &project_id, &phase_id, &RequestId::from("rq1")),
            "customers/c1/projects/p1/phases/ph1/requests/rq1"
        );
        assert_eq!(
            change("c1", &project_id, &phase_id, &ChangeId::from("ch1")),
            "customers/c1/projects/p1/phases/ph1/changes/ch1"
        );
    }
}
