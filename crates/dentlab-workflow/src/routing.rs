//! 派工候选
//!
//! 按部门筛选可派工的员工，并根据手头进行中的工序数给出建议人选

use dentlab_core::{Case, Department, Staff, StaffStatus, StepStatus};
use serde::Serialize;
use std::collections::HashMap;

/// 派工候选人
#[derive(Debug, Clone, Serialize)]
pub struct StaffCandidate {
    pub staff: Staff,
    pub open_assignments: usize,
}

/// 每位员工名下进行中的工序数
pub fn workload_map(cases: &[Case]) -> HashMap<&str, usize> {
    let mut workload = HashMap::new();
    for step in cases.iter().flat_map(|case| case.workflow.iter()) {
        if step.status != StepStatus::InProgress {
            continue;
        }
        if let Some(staff_id) = step.assigned_staff.as_deref() {
            *workload.entry(staff_id).or_insert(0) += 1;
        }
    }
    workload
}

/// 该部门的在岗员工（离线除外），空闲者优先，其次按负载和姓名排序
pub fn assignable_staff(staff: &[Staff], cases: &[Case], department: Department) -> Vec<StaffCandidate> {
    let workload = workload_map(cases);

    let mut candidates: Vec<StaffCandidate> = staff
        .iter()
        .filter(|s| s.department == department && s.status != StaffStatus::Offline)
        .map(|s| StaffCandidate {
            staff: s.clone(),
            open_assignments: workload.get(s.staff_id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    candidates.sort_by(|a, b| {
        let busy_a = a.staff.status == StaffStatus::Busy;
        let busy_b = b.staff.status == StaffStatus::Busy;
        busy_a
            .cmp(&busy_b)
            .then(a.open_assignments.cmp(&b.open_assignments))
            .then_with(|| a.staff.name.cmp(&b.staff.name))
    });

    candidates
}

/// 建议人选：负载最低的空闲员工
pub fn suggest_assignee(staff: &[Staff], cases: &[Case], department: Department) -> Option<StaffCandidate> {
    assignable_staff(staff, cases, department)
        .into_iter()
        .find(|candidate| candidate.staff.status == StaffStatus::Active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::WorkflowEngine;
    use chrono::Utc;
    use dentlab_core::{CaseAttributes, CaseCategory, CasePriority, NewCase, StaffRole};
    use uuid::Uuid;

    fn staff(id: &str, name: &str, department: Department, status: StaffStatus) -> Staff {
        Staff {
            id: Uuid::new_v4(),
            staff_id: id.to_string(),
            name: name.to_string(),
            department,
            role: StaffRole::Technician,
            status,
            phone: None,
            email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reception_case(engine: &WorkflowEngine, id: &str, assignee: Option<&str>) -> Case {
        let mut case = engine
            .open_case(
                NewCase {
                    case_id: None,
                    doctor: "Dr. Haddad".to_string(),
                    patient: "J. Smith".to_string(),
                    category: CaseCategory::Removable,
                    attributes: CaseAttributes::default(),
                    priority: CasePriority::Normal,
                    due_date: None,
                    instructions: None,
                },
                id.to_string(),
                Utc::now(),
            )
            .unwrap();
        if let Some(staff_id) = assignee {
            engine.assign(&mut case, Department::Reception, staff_id, Utc::now());
        }
        case
    }

    #[test]
    fn test_assignable_staff_filters_department_and_offline() {
        let roster = vec![
            staff("S1", "Omar", Department::Reception, StaffStatus::Active),
            staff("S2", "Lina", Department::Reception, StaffStatus::Offline),
            staff("S3", "Rami", Department::CadDesign, StaffStatus::Active),
            staff("S4", "Dana", Department::Reception, StaffStatus::Busy),
        ];

        let candidates = assignable_staff(&roster, &[], Department::Reception);
        let ids: Vec<_> = candidates.iter().map(|c| c.staff.staff_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S4"]);
    }

    #[test]
    fn test_suggest_assignee_prefers_lowest_workload() {
        let engine = WorkflowEngine::new();
        let roster = vec![
            staff("S1", "Amal", Department::Reception, StaffStatus::Active),
            staff("S2", "Basel", Department::Reception, StaffStatus::Active),
        ];
        let cases = vec![
            reception_case(&engine, "CASE-1", Some("S1")),
            reception_case(&engine, "CASE-2", Some("S1")),
            reception_case(&engine, "CASE-3", Some("S2")),
        ];

        let workload = workload_map(&cases);
        assert_eq!(workload["S1"], 2);

        let suggestion = suggest_assignee(&roster, &cases, Department::Reception).unwrap();
        assert_eq!(suggestion.staff.staff_id, "S2");
        assert_eq!(suggestion.open_assignments, 1);
    }

    #[test]
    fn test_no_suggestion_when_everyone_busy() {
        let roster = vec![staff("S1", "Amal", Department::Milling, StaffStatus::Busy)];
        assert!(suggest_assignee(&roster, &[], Department::Milling).is_none());
        assert_eq!(assignable_staff(&roster, &[], Department::Milling).len(), 1);
    }
}
