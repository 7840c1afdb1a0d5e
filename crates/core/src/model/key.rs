//! Structured department keys.
//!
//! Department budgets are keyed by phase and department name. Historical
//! records persisted the key as a `phaseId_departmentName` composite string;
//! older records used the bare department name. Internally the key is
//! structured; the composite form is produced only at the store boundary,
//! and both wire forms are accepted on read.

use serde::{Deserialize, Serialize};

use buildtrack_shared::types::PhaseId;

/// A department budget key scoped to one phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeptKey {
    /// Phase the department belongs to.
    pub phase_id: PhaseId,
    /// Department name, unique within the phase.
    pub name: String,
}

impl DeptKey {
    /// Creates a key for a department within a phase.
    #[must_use]
    pub fn new(phase_id: PhaseId, name: impl Into<String>) -> Self {
        Self {
            phase_id,
            name: name.into(),
        }
    }

    /// Renders the composite wire form, always used on write.
    #[must_use]
    pub fn composite(&self) -> String {
        format!("{}_{}", self.phase_id, self.name)
    }

    /// Parses a wire key read in the context of a known phase.
    ///
    /// Accepts both the composite `phaseId_name` form and the legacy bare
    /// `name` form. A composite key carrying a different phase prefix is
    /// treated as a bare name (same-named departments in other phases must
    /// not alias into this one).
    #[must_use]
    pub fn parse_in_phase(raw: &str, phase_id: &PhaseId) -> Self {
        let prefix = format!("{phase_id}_");
        let name = raw.strip_prefix(&prefix).unwrap_or(raw);
        Self {
            phase_id: phase_id.clone(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for DeptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.composite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_form() {
        let key = DeptKey::new(PhaseId::from("ph1"), "Electrical");
        assert_eq!(key.composite(), "ph1_Electrical");
    }

    #[test]
    fn test_parse_composite() {
        let phase = PhaseId::from("ph1");
        let key = DeptKey::parse_in_phase("ph1_Electrical", &phase);
        assert_eq!(key.name, "Electrical");
        assert_eq!(key.phase_id, phase);
    }

    #[test]
    fn test_parse_legacy_bare_name() {
        let phase = PhaseId::from("ph1");
        let key = DeptKey::parse_in_phase("Electrical", &phase);
        assert_eq!(key.name, "Electrical");
    }

    #[test]
    fn test_parse_foreign_prefix_stays_bare() {
        let phase = PhaseId::from("ph1");
        let key = DeptKey::parse_in_phase("ph2_Electrical", &phase);
        // Not our composite prefix, so the whole string is the name.
        assert_eq!(key.name, "ph2_Electrical");
        assert_eq!(key.phase_id, phase);
    }

    #[test]
    fn test_name_containing_underscore() {
        let phase = PhaseId::from("ph1");
        let key = DeptKey::parse_in_phase("ph1_Site_Works", &phase);
        assert_eq!(key.name, "Site_Works");
    }
}
