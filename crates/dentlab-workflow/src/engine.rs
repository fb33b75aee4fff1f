//! 工作流引擎
//!
//! 在单个病例上执行流程推进、派工、暂停/恢复和结案。
//! 所有转换都由调用方显式触发；条件不满足时返回 `Transition::NoOp`，不视为错误。

use crate::state_machine::{StepEvent, StepStateMachine};
use crate::templates::build_workflow;
use chrono::{DateTime, Utc};
use dentlab_core::{
    Case, CaseStatus, Department, LabError, NewCase, PauseAction, PauseRecord, Result, StepStatus,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 未执行转换的原因
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    NoStepInProgress,
    FinalStage,
    NotFinalStage,
    CasePaused,
    AlreadyPaused,
    NotPaused,
    CaseCompleted,
    StepNotInWorkflow,
    StepNotInProgress,
    StepAlreadyAssigned,
}

/// 一次转换的结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Transition {
    Advanced { from: Department, to: Department },
    Assigned { department: Department, staff_id: String },
    Paused,
    Resumed,
    Completed { department: Department },
    NoOp { reason: NoOpReason },
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        matches!(self, Transition::NoOp { .. })
    }

    fn noop(reason: NoOpReason) -> Self {
        Transition::NoOp { reason }
    }
}

/// 工作流引擎
#[derive(Debug, Default)]
pub struct WorkflowEngine {
    state_machine: StepStateMachine,
}

impl WorkflowEngine {
    /// 创建新的工作流引擎
    pub fn new() -> Self {
        Self {
            state_machine: StepStateMachine::new(),
        }
    }

    /// 按类别模板开立病例，第一道工序立即开始
    pub fn open_case(&self, request: NewCase, case_id: String, now: DateTime<Utc>) -> Result<Case> {
        let mut workflow = build_workflow(request.category);
        if let Some(first) = workflow.first_mut() {
            first.status = self.state_machine.transition(first.status, StepEvent::Start)?;
            first.started_at = Some(now);
        }

        let case = Case {
            id: Uuid::new_v4(),
            case_id,
            doctor: request.doctor,
            patient: request.patient,
            category: request.category,
            attributes: request.attributes,
            priority: request.priority,
            due_date: request.due_date,
            instructions: request.instructions,
            workflow,
            current_stage_index: 0,
            is_paused: false,
            pause_history: Vec::new(),
            status: CaseStatus::Active,
            created_at: now,
            updated_at: now,
        };

        tracing::info!(
            "Opened case {} ({}) with {} stages",
            case.case_id,
            case.category.as_str(),
            case.workflow.len()
        );
        Ok(case)
    }

    /// 完成当前工序并开始下一道工序
    pub fn advance(&self, case: &mut Case, now: DateTime<Utc>) -> Result<Transition> {
        self.verify_invariants(case)?;

        if case.status == CaseStatus::Completed {
            return Ok(Transition::noop(NoOpReason::CaseCompleted));
        }
        if case.is_paused {
            return Ok(Transition::noop(NoOpReason::CasePaused));
        }
        let Some((index, _)) = case.in_progress_step() else {
            return Ok(Transition::noop(NoOpReason::NoStepInProgress));
        };
        if index + 1 >= case.workflow.len() {
            return Ok(Transition::noop(NoOpReason::FinalStage));
        }

        let next_status = self
            .state_machine
            .transition(case.workflow[index + 1].status, StepEvent::Start)?;
        let done_status = self
            .state_machine
            .transition(case.workflow[index].status, StepEvent::Complete)?;

        let current = &mut case.workflow[index];
        current.status = done_status;
        current.completed_at = Some(now);
        let from = current.department;

        let next = &mut case.workflow[index + 1];
        next.status = next_status;
        next.started_at = Some(now);
        let to = next.department;

        case.current_stage_index = case.first_open_index();
        case.updated_at = now;

        tracing::info!("Case {} advanced from {} to {}", case.case_id, from, to);
        Ok(Transition::Advanced { from, to })
    }

    /// 为进行中且未派工的工序指派员工
    pub fn assign(
        &self,
        case: &mut Case,
        department: Department,
        staff_id: &str,
        now: DateTime<Utc>,
    ) -> Transition {
        let Some(step) = case.workflow.iter_mut().find(|s| s.department == department) else {
            return Transition::noop(NoOpReason::StepNotInWorkflow);
        };
        if step.status != StepStatus::InProgress {
            return Transition::noop(NoOpReason::StepNotInProgress);
        }
        if step.assigned_staff.is_some() {
            return Transition::noop(NoOpReason::StepAlreadyAssigned);
        }

        step.assigned_staff = Some(staff_id.to_string());
        case.updated_at = now;

        tracing::info!("Case {} step {} assigned to {}", case.case_id, department, staff_id);
        Transition::Assigned {
            department,
            staff_id: staff_id.to_string(),
        }
    }

    /// 暂停病例并记录原因
    pub fn pause(
        &self,
        case: &mut Case,
        reason: Option<String>,
        actor: Option<String>,
        now: DateTime<Utc>,
    ) -> Transition {
        if case.status == CaseStatus::Completed {
            return Transition::noop(NoOpReason::CaseCompleted);
        }
        if case.is_paused {
            return Transition::noop(NoOpReason::AlreadyPaused);
        }

        case.is_paused = true;
        case.pause_history.push(PauseRecord {
            action: PauseAction::Paused,
            department: case.current_department(),
            reason,
            actor,
            at: now,
        });
        case.updated_at = now;

        tracing::info!("Case {} paused", case.case_id);
        Transition::Paused
    }

    /// 恢复已暂停的病例
    pub fn resume(&self, case: &mut Case, actor: Option<String>, now: DateTime<Utc>) -> Transition {
        if !case.is_paused {
            return Transition::noop(NoOpReason::NotPaused);
        }

        case.is_paused = false;
        case.pause_history.push(PauseRecord {
            action: PauseAction::Resumed,
            department: case.current_department(),
            reason: None,
            actor,
            at: now,
        });
        case.updated_at = now;

        tracing::info!("Case {} resumed", case.case_id);
        Transition::Resumed
    }

    /// 完成最后一道工序并结案
    pub fn complete(&self, case: &mut Case, now: DateTime<Utc>) -> Result<Transition> {
        self.verify_invariants(case)?;

        if case.status == CaseStatus::Completed {
            return Ok(Transition::noop(NoOpReason::CaseCompleted));
        }
        if case.is_paused {
            return Ok(Transition::noop(NoOpReason::CasePaused));
        }
        let Some((index, _)) = case.in_progress_step() else {
            return Ok(Transition::noop(NoOpReason::NoStepInProgress));
        };
        if index + 1 != case.workflow.len() {
            return Ok(Transition::noop(NoOpReason::NotFinalStage));
        }

        let step = &mut case.workflow[index];
        step.status = self.state_machine.transition(step.status, StepEvent::Complete)?;
        step.completed_at = Some(now);
        let department = step.department;

        case.current_stage_index = case.first_open_index();
        case.status = CaseStatus::Completed;
        case.updated_at = now;

        tracing::info!("Case {} completed at {}", case.case_id, department);
        Ok(Transition::Completed { department })
    }

    /// 校验病例流程不变量：
    /// 最多一个进行中工序，当前下标指向第一个未完成工序，已完成工序全部位于其之前
    pub fn verify_invariants(&self, case: &Case) -> Result<()> {
        let in_progress = case
            .workflow
            .iter()
            .filter(|s| s.status == StepStatus::InProgress)
            .count();
        if in_progress > 1 {
            return Err(LabError::Internal(format!(
                "case {} has {} steps in progress",
                case.case_id, in_progress
            )));
        }

        let first_open = case.first_open_index();
        if case.current_stage_index != first_open {
            return Err(LabError::Internal(format!(
                "case {} stage index {} does not match first open step {}",
                case.case_id, case.current_stage_index, first_open
            )));
        }

        if case.workflow[first_open..]
            .iter()
            .any(|s| s.status == StepStatus::Completed)
        {
            return Err(LabError::Internal(format!(
                "case {} has completed steps after an open step",
                case.case_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentlab_core::{CaseAttributes, CaseCategory, CasePriority};

    fn new_case(category: CaseCategory) -> NewCase {
        NewCase {
            case_id: None,
            doctor: "Dr. Haddad".to_string(),
            patient: "J. Smith".to_string(),
            category,
            attributes: CaseAttributes::default(),
            priority: CasePriority::Rush,
            due_date: None,
            instructions: None,
        }
    }

    fn open(engine: &WorkflowEngine, category: CaseCategory) -> Case {
        engine
            .open_case(new_case(category), "CASE-1".to_string(), Utc::now())
            .unwrap()
    }

    fn in_progress_count(case: &Case) -> usize {
        case.workflow
            .iter()
            .filter(|s| s.status == StepStatus::InProgress)
            .count()
    }

    #[test]
    fn test_open_case_starts_first_stage() {
        let engine = WorkflowEngine::new();
        let case = open(&engine, CaseCategory::Fixed);

        assert_eq!(case.current_stage_index, 0);
        assert_eq!(case.workflow[0].status, StepStatus::InProgress);
        assert!(case.workflow[0].started_at.is_some());
        assert_eq!(in_progress_count(&case), 1);
        assert!(engine.verify_invariants(&case).is_ok());
    }

    #[test]
    fn test_advance_moves_to_next_stage() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Removable);

        let transition = engine.advance(&mut case, Utc::now()).unwrap();
        assert_eq!(
            transition,
            Transition::Advanced {
                from: Department::Reception,
                to: Department::ModelRoom,
            }
        );
        assert_eq!(case.workflow[0].status, StepStatus::Completed);
        assert!(case.workflow[0].completed_at.is_some());
        assert_eq!(case.workflow[1].status, StepStatus::InProgress);
        assert_eq!(case.current_stage_index, 1);
        assert_eq!(in_progress_count(&case), 1);
    }

    #[test]
    fn test_at_most_one_step_in_progress_through_lifecycle() {
        let engine = WorkflowEngine::new();
        for category in [CaseCategory::Fixed, CaseCategory::Removable, CaseCategory::Orthodontics] {
            let mut case = open(&engine, category);
            loop {
                assert!(in_progress_count(&case) <= 1);
                assert!(engine.verify_invariants(&case).is_ok());
                if engine.advance(&mut case, Utc::now()).unwrap().is_noop() {
                    break;
                }
            }
            assert_eq!(case.current_stage_index, case.workflow.len() - 1);
        }
    }

    #[test]
    fn test_advance_at_final_stage_is_noop() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Orthodontics);
        while !engine.advance(&mut case, Utc::now()).unwrap().is_noop() {}

        let before = case.clone();
        let transition = engine.advance(&mut case, Utc::now()).unwrap();
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::FinalStage });
        assert_eq!(case, before);
    }

    #[test]
    fn test_advance_without_step_in_progress_is_noop() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Fixed);
        case.workflow[0].status = StepStatus::Pending;

        let before = case.clone();
        let transition = engine.advance(&mut case, Utc::now()).unwrap();
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::NoStepInProgress });
        assert_eq!(case, before);
    }

    #[test]
    fn test_advance_completed_case_is_noop() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Removable);
        while !engine.advance(&mut case, Utc::now()).unwrap().is_noop() {}
        engine.complete(&mut case, Utc::now()).unwrap();

        let transition = engine.advance(&mut case, Utc::now()).unwrap();
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::CaseCompleted });
    }

    #[test]
    fn test_paused_case_does_not_advance() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Fixed);

        assert_eq!(
            engine.pause(&mut case, Some("waiting for bite".to_string()), None, Utc::now()),
            Transition::Paused
        );
        let transition = engine.advance(&mut case, Utc::now()).unwrap();
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::CasePaused });
        assert_eq!(case.current_stage_index, 0);

        assert_eq!(engine.resume(&mut case, None, Utc::now()), Transition::Resumed);
        assert!(!engine.advance(&mut case, Utc::now()).unwrap().is_noop());
    }

    #[test]
    fn test_pause_history_is_appended() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Fixed);

        engine.pause(&mut case, Some("shade check".to_string()), Some("STAFF-1".to_string()), Utc::now());
        assert!(engine.pause(&mut case, None, None, Utc::now()).is_noop());
        engine.resume(&mut case, None, Utc::now());
        assert!(engine.resume(&mut case, None, Utc::now()).is_noop());

        assert_eq!(case.pause_history.len(), 2);
        assert_eq!(case.pause_history[0].action, PauseAction::Paused);
        assert_eq!(case.pause_history[0].department, Some(Department::Reception));
        assert_eq!(case.pause_history[0].reason.as_deref(), Some("shade check"));
        assert_eq!(case.pause_history[1].action, PauseAction::Resumed);
    }

    #[test]
    fn test_assign_only_in_progress_unassigned_step() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Fixed);

        let transition = engine.assign(&mut case, Department::CadDesign, "STAFF-7", Utc::now());
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::StepNotInProgress });
        assert!(case.step_for(Department::CadDesign).unwrap().assigned_staff.is_none());

        let transition = engine.assign(&mut case, Department::Reception, "STAFF-1", Utc::now());
        assert!(matches!(transition, Transition::Assigned { .. }));

        let transition = engine.assign(&mut case, Department::Reception, "STAFF-2", Utc::now());
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::StepAlreadyAssigned });
        assert_eq!(case.workflow[0].assigned_staff.as_deref(), Some("STAFF-1"));

        let transition = engine.assign(&mut case, Department::Acrylic, "STAFF-1", Utc::now());
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::StepNotInWorkflow });
    }

    #[test]
    fn test_assign_completed_step_has_no_effect() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Fixed);
        engine.advance(&mut case, Utc::now()).unwrap();

        assert!(engine
            .assign(&mut case, Department::Reception, "STAFF-1", Utc::now())
            .is_noop());
        assert!(case.workflow[0].assigned_staff.is_none());
    }

    #[test]
    fn test_complete_requires_final_stage() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Orthodontics);

        let transition = engine.complete(&mut case, Utc::now()).unwrap();
        assert_eq!(transition, Transition::NoOp { reason: NoOpReason::NotFinalStage });

        while !engine.advance(&mut case, Utc::now()).unwrap().is_noop() {}
        let transition = engine.complete(&mut case, Utc::now()).unwrap();
        assert_eq!(transition, Transition::Completed { department: Department::Shipping });
        assert_eq!(case.status, CaseStatus::Completed);
        assert_eq!(case.current_stage_index, case.workflow.len());
        assert_eq!(in_progress_count(&case), 0);
        assert!(engine.verify_invariants(&case).is_ok());
        assert!(engine.pause(&mut case, None, None, Utc::now()).is_noop());
    }

    #[test]
    fn test_broken_invariants_are_reported() {
        let engine = WorkflowEngine::new();
        let mut case = open(&engine, CaseCategory::Fixed);
        case.workflow[1].status = StepStatus::InProgress;

        assert!(matches!(engine.advance(&mut case, Utc::now()), Err(LabError::Internal(_))));
    }
}
