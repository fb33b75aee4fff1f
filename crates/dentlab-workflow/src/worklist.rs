//! 部门工作看板
//!
//! 为每个部门列出当前停留在该部门的病例，并汇总全所的流转概况

use chrono::{DateTime, NaiveDate, Utc};
use dentlab_core::{Case, CasePriority, CaseStatus, Department, DepartmentInfo};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// 看板上的一个病例
#[derive(Debug, Clone, Serialize)]
pub struct WorkItem {
    pub case_id: String,
    pub doctor: String,
    pub patient: String,
    pub priority: CasePriority,
    pub due_date: Option<NaiveDate>,
    pub assigned_staff: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub overdue: bool,
}

/// 看板统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkListStats {
    pub total_items: usize,
    pub unassigned_items: usize,
    pub paused_items: usize,
    pub overdue_items: usize,
    pub workload_by_priority: BTreeMap<CasePriority, usize>,
}

/// 部门看板
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentBoard {
    pub department: DepartmentInfo,
    pub items: Vec<WorkItem>,
    pub stats: WorkListStats,
}

/// 全所概况
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabOverview {
    pub total_cases: usize,
    pub active_cases: usize,
    pub completed_cases: usize,
    pub paused_cases: usize,
    pub overdue_cases: usize,
    pub cases_by_department: BTreeMap<Department, usize>,
}

impl DepartmentBoard {
    /// 当前工序位于该部门的活动病例，紧急程度高的在前，同级按交期先后
    pub fn build(department: Department, cases: &[Case], today: NaiveDate) -> Self {
        let mut selected: Vec<&Case> = cases
            .iter()
            .filter(|case| {
                case.status == CaseStatus::Active && case.current_department() == Some(department)
            })
            .collect();

        selected.sort_by_key(|case| {
            (
                Reverse(case.priority),
                case.due_date.is_none(),
                case.due_date,
                case.created_at,
            )
        });

        let items: Vec<WorkItem> = selected
            .into_iter()
            .map(|case| {
                let step = case.current_step();
                WorkItem {
                    case_id: case.case_id.clone(),
                    doctor: case.doctor.clone(),
                    patient: case.patient.clone(),
                    priority: case.priority,
                    due_date: case.due_date,
                    assigned_staff: step.and_then(|s| s.assigned_staff.clone()),
                    started_at: step.and_then(|s| s.started_at),
                    is_paused: case.is_paused,
                    overdue: case.is_overdue(today),
                }
            })
            .collect();

        let stats = WorkListStats::from_items(&items);
        Self {
            department: department.info(),
            items,
            stats,
        }
    }
}

impl WorkListStats {
    fn from_items(items: &[WorkItem]) -> Self {
        let mut stats = WorkListStats {
            total_items: items.len(),
            ..Default::default()
        };

        for item in items {
            if item.assigned_staff.is_none() {
                stats.unassigned_items += 1;
            }
            if item.is_paused {
                stats.paused_items += 1;
            }
            if item.overdue {
                stats.overdue_items += 1;
            }
            *stats.workload_by_priority.entry(item.priority).or_insert(0) += 1;
        }

        stats
    }
}

impl LabOverview {
    pub fn build(cases: &[Case], today: NaiveDate) -> Self {
        let mut overview = LabOverview {
            total_cases: cases.len(),
            ..Default::default()
        };

        for case in cases {
            match case.status {
                CaseStatus::Active => overview.active_cases += 1,
                CaseStatus::Completed => overview.completed_cases += 1,
            }
            if case.is_paused {
                overview.paused_cases += 1;
            }
            if case.is_overdue(today) {
                overview.overdue_cases += 1;
            }
            if let (CaseStatus::Active, Some(department)) = (case.status, case.current_department()) {
                *overview.cases_by_department.entry(department).or_insert(0) += 1;
            }
        }

        overview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::WorkflowEngine;
    use dentlab_core::{CaseAttributes, CaseCategory, NewCase};

    fn case(engine: &WorkflowEngine, id: &str, priority: CasePriority, due: Option<NaiveDate>) -> Case {
        engine
            .open_case(
                NewCase {
                    case_id: None,
                    doctor: "Dr. Haddad".to_string(),
                    patient: format!("Patient {}", id),
                    category: CaseCategory::Fixed,
                    attributes: CaseAttributes::default(),
                    priority,
                    due_date: due,
                    instructions: None,
                },
                id.to_string(),
                Utc::now(),
            )
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn test_board_orders_by_priority_then_due_date() {
        let engine = WorkflowEngine::new();
        let cases = vec![
            case(&engine, "A", CasePriority::Normal, Some(date(2))),
            case(&engine, "B", CasePriority::Emergency, None),
            case(&engine, "C", CasePriority::Rush, Some(date(9))),
            case(&engine, "D", CasePriority::Rush, Some(date(4))),
            case(&engine, "E", CasePriority::Normal, None),
        ];

        let board = DepartmentBoard::build(Department::Reception, &cases, date(1));
        let order: Vec<_> = board.items.iter().map(|i| i.case_id.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "C", "A", "E"]);
        assert_eq!(board.stats.total_items, 5);
        assert_eq!(board.stats.unassigned_items, 5);
        assert_eq!(board.stats.workload_by_priority[&CasePriority::Rush], 2);
    }

    #[test]
    fn test_board_only_lists_cases_in_department() {
        let engine = WorkflowEngine::new();
        let mut moved = case(&engine, "A", CasePriority::Normal, Some(date(2)));
        engine.advance(&mut moved, Utc::now()).unwrap();
        let mut paused = case(&engine, "B", CasePriority::Normal, None);
        engine.advance(&mut paused, Utc::now()).unwrap();
        engine.pause(&mut paused, None, None, Utc::now());
        let cases = vec![moved, paused, case(&engine, "C", CasePriority::Normal, None)];

        let board = DepartmentBoard::build(Department::ModelRoom, &cases, date(5));
        assert_eq!(board.items.len(), 2);
        assert_eq!(board.stats.paused_items, 1);
        assert_eq!(board.stats.overdue_items, 1);
        assert_eq!(board.department.department, Department::ModelRoom);

        let reception = DepartmentBoard::build(Department::Reception, &cases, date(5));
        assert_eq!(reception.items.len(), 1);
    }

    #[test]
    fn test_overview_counts() {
        let engine = WorkflowEngine::new();
        let mut done = case(&engine, "A", CasePriority::Normal, Some(date(1)));
        while !engine.advance(&mut done, Utc::now()).unwrap().is_noop() {}
        engine.complete(&mut done, Utc::now()).unwrap();
        let cases = vec![
            done,
            case(&engine, "B", CasePriority::Rush, Some(date(1))),
            case(&engine, "C", CasePriority::Normal, None),
        ];

        let overview = LabOverview::build(&cases, date(3));
        assert_eq!(overview.total_cases, 3);
        assert_eq!(overview.completed_cases, 1);
        assert_eq!(overview.active_cases, 2);
        assert_eq!(overview.overdue_cases, 1);
        assert_eq!(overview.cases_by_department[&Department::Reception], 2);
        assert!(!overview.cases_by_department.contains_key(&Department::Shipping));
    }
}
