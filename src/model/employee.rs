use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub employee_no: String,
    pub department_id: Option<u64>,
    pub position: Option<String>,
    pub phone: Option<String>,
    /// Comma-separated tag list as stored; use [`Employee::tags`] to read.
    pub tags: Option<String>,
}

impl Employee {
    pub fn tags(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|t| t.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// Fields accepted when creating or updating an employee.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeInput {
    pub id: Option<u64>,
    pub name: String,
    pub employee_no: String,
    pub department_id: Option<u64>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub tags: Option<String>,
}

/// Filter for employee lookups; all fields are optional and ANDed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    pub department_id: Option<u64>,
    /// Substring match against name or employee_no.
    pub search: Option<String>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(dept) = self.department_id {
            if employee.department_id != Some(dept) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !employee.name.contains(search.as_str())
                && !employee.employee_no.contains(search.as_str())
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> Employee {
        Employee {
            id: 1,
            name: "Ada Lovelace".into(),
            employee_no: "EMP-001".into(),
            department_id: Some(7),
            position: Some("Engineer".into()),
            phone: None,
            tags: Some("backend, oncall".into()),
        }
    }

    #[test]
    fn tags_split_and_trim() {
        assert_eq!(employee().tags(), vec!["backend", "oncall"]);
    }

    #[test]
    fn filter_matches_department_and_search() {
        let emp = employee();
        assert!(EmployeeFilter::default().matches(&emp));
        assert!(
            EmployeeFilter { department_id: Some(7), search: Some("EMP-0".into()) }.matches(&emp)
        );
        assert!(!EmployeeFilter { department_id: Some(8), ..Default::default() }.matches(&emp));
        assert!(
            !EmployeeFilter { search: Some("Grace".into()), ..Default::default() }.matches(&emp)
        );
    }
}
