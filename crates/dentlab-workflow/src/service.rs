//! 技工所业务服务
//!
//! 协调存储接口与工作流引擎，对外提供病例、员工、备注和附件的全部命名操作。
//! 病例修改都是“读取-修改-整体写回”，不带版本号，并发修改时后写者覆盖先写者。

use crate::engine::{Transition, WorkflowEngine};
use crate::routing::{self, StaffCandidate};
use crate::worklist::{DepartmentBoard, LabOverview};
use chrono::Utc;
use dentlab_core::utils::{generate_case_id, generate_staff_id};
use dentlab_core::{
    Case, CaseLogRepository, CaseNote, CaseRepository, CaseUpdate, Department, FileAttachment,
    LabError, NewCase, NewCaseNote, NewFileAttachment, NewStaff, Result, Staff, StaffRepository,
    StaffStatus, StaffUpdate,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// 转换后的病例及转换结果
#[derive(Debug, Clone, Serialize)]
pub struct CaseTransition {
    pub case: Case,
    pub transition: Transition,
}

/// 技工所业务服务
pub struct LabService {
    cases: Arc<dyn CaseRepository>,
    staff: Arc<dyn StaffRepository>,
    logs: Arc<dyn CaseLogRepository>,
    engine: WorkflowEngine,
}

impl LabService {
    pub fn new(
        cases: Arc<dyn CaseRepository>,
        staff: Arc<dyn StaffRepository>,
        logs: Arc<dyn CaseLogRepository>,
    ) -> Self {
        Self {
            cases,
            staff,
            logs,
            engine: WorkflowEngine::new(),
        }
    }

    /// 由同时实现三个存储接口的单一存储构建
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: CaseRepository + StaffRepository + CaseLogRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store)
    }

    // ========== 病例 ==========

    pub async fn list_cases(&self) -> Result<Vec<Case>> {
        self.cases.list_cases().await
    }

    pub async fn get_case(&self, case_id: &str) -> Result<Case> {
        self.cases
            .get_case(case_id)
            .await?
            .ok_or_else(|| LabError::case_not_found(case_id))
    }

    /// 开立病例，未指定编号时生成 `CASE-<时间戳>`
    pub async fn create_case(&self, mut request: NewCase) -> Result<Case> {
        request.validate()?;

        let case_id = request
            .case_id
            .take()
            .map(|id| id.trim().to_string())
            .unwrap_or_else(generate_case_id);
        let case = self.engine.open_case(request, case_id, Utc::now())?;

        self.cases.insert_case(&case).await?;
        tracing::info!("Created case {}", case.case_id);
        Ok(case)
    }

    pub async fn update_case(&self, case_id: &str, update: CaseUpdate) -> Result<Case> {
        update.validate()?;

        let mut case = self.get_case(case_id).await?;
        update.apply_to(&mut case);
        self.store_case(&case).await?;

        tracing::info!("Updated case {}", case_id);
        Ok(case)
    }

    pub async fn delete_case(&self, case_id: &str) -> Result<()> {
        if !self.cases.delete_case(case_id).await? {
            return Err(LabError::case_not_found(case_id));
        }
        tracing::info!("Deleted case {}", case_id);
        Ok(())
    }

    // ========== 工作流 ==========

    pub async fn advance_case(&self, case_id: &str) -> Result<CaseTransition> {
        let mut case = self.get_case(case_id).await?;
        let transition = self.engine.advance(&mut case, Utc::now())?;
        self.finish_transition(case, transition).await
    }

    /// 派工：员工必须存在、属于该部门且不处于离线状态
    pub async fn assign_staff(
        &self,
        case_id: &str,
        department: Department,
        staff_id: &str,
    ) -> Result<CaseTransition> {
        let member = self
            .staff
            .get_staff(staff_id)
            .await?
            .ok_or_else(|| LabError::staff_not_found(staff_id))?;
        if member.department != department {
            return Err(LabError::Validation(format!(
                "staff {} belongs to {}, not {}",
                staff_id, member.department, department
            )));
        }
        if member.status == StaffStatus::Offline {
            return Err(LabError::Validation(format!("staff {} is offline", staff_id)));
        }

        let mut case = self.get_case(case_id).await?;
        let transition = self.engine.assign(&mut case, department, staff_id, Utc::now());
        self.finish_transition(case, transition).await
    }

    pub async fn pause_case(
        &self,
        case_id: &str,
        reason: Option<String>,
        actor: Option<String>,
    ) -> Result<CaseTransition> {
        let mut case = self.get_case(case_id).await?;
        let transition = self.engine.pause(&mut case, reason, actor, Utc::now());
        self.finish_transition(case, transition).await
    }

    pub async fn resume_case(&self, case_id: &str, actor: Option<String>) -> Result<CaseTransition> {
        let mut case = self.get_case(case_id).await?;
        let transition = self.engine.resume(&mut case, actor, Utc::now());
        self.finish_transition(case, transition).await
    }

    pub async fn complete_case(&self, case_id: &str) -> Result<CaseTransition> {
        let mut case = self.get_case(case_id).await?;
        let transition = self.engine.complete(&mut case, Utc::now())?;
        self.finish_transition(case, transition).await
    }

    async fn finish_transition(&self, case: Case, transition: Transition) -> Result<CaseTransition> {
        if transition.is_noop() {
            tracing::warn!("Case {} transition skipped: {:?}", case.case_id, transition);
        } else {
            self.store_case(&case).await?;
        }
        Ok(CaseTransition { case, transition })
    }

    async fn store_case(&self, case: &Case) -> Result<()> {
        if !self.cases.save_case(case).await? {
            // 读取之后被并发删除
            return Err(LabError::case_not_found(&case.case_id));
        }
        Ok(())
    }

    // ========== 备注与附件 ==========

    pub async fn add_note(&self, case_id: &str, request: NewCaseNote) -> Result<CaseNote> {
        request.validate()?;
        self.get_case(case_id).await?;

        let note = CaseNote {
            id: Uuid::new_v4(),
            case_id: case_id.to_string(),
            author: request.author,
            content: request.content,
            created_at: Utc::now(),
        };
        self.logs.append_note(&note).await?;
        Ok(note)
    }

    pub async fn list_notes(&self, case_id: &str) -> Result<Vec<CaseNote>> {
        self.get_case(case_id).await?;
        self.logs.list_notes(case_id).await
    }

    pub async fn add_attachment(
        &self,
        case_id: &str,
        request: NewFileAttachment,
    ) -> Result<FileAttachment> {
        request.validate()?;
        self.get_case(case_id).await?;

        let attachment = FileAttachment {
            id: Uuid::new_v4(),
            case_id: case_id.to_string(),
            file_name: request.file_name,
            content_type: request.content_type,
            size_bytes: request.size_bytes,
            url: request.url,
            uploaded_by: request.uploaded_by,
            uploaded_at: Utc::now(),
        };
        self.logs.append_attachment(&attachment).await?;
        tracing::info!("Attached {} to case {}", attachment.file_name, case_id);
        Ok(attachment)
    }

    pub async fn list_attachments(&self, case_id: &str) -> Result<Vec<FileAttachment>> {
        self.get_case(case_id).await?;
        self.logs.list_attachments(case_id).await
    }

    // ========== 员工 ==========

    pub async fn list_staff(&self, department: Option<Department>) -> Result<Vec<Staff>> {
        self.staff.list_staff(department).await
    }

    pub async fn get_staff(&self, staff_id: &str) -> Result<Staff> {
        self.staff
            .get_staff(staff_id)
            .await?
            .ok_or_else(|| LabError::staff_not_found(staff_id))
    }

    pub async fn create_staff(&self, mut request: NewStaff) -> Result<Staff> {
        request.validate()?;

        let now = Utc::now();
        let staff = Staff {
            id: Uuid::new_v4(),
            staff_id: request
                .staff_id
                .take()
                .map(|id| id.trim().to_string())
                .unwrap_or_else(generate_staff_id),
            name: request.name,
            department: request.department,
            role: request.role,
            status: request.status,
            phone: request.phone,
            email: request.email,
            created_at: now,
            updated_at: now,
        };

        self.staff.insert_staff(&staff).await?;
        tracing::info!("Added staff {} to {}", staff.staff_id, staff.department);
        Ok(staff)
    }

    pub async fn update_staff(&self, staff_id: &str, update: StaffUpdate) -> Result<Staff> {
        update.validate()?;

        let mut staff = self.get_staff(staff_id).await?;
        update.apply_to(&mut staff);
        if !self.staff.save_staff(&staff).await? {
            return Err(LabError::staff_not_found(staff_id));
        }
        Ok(staff)
    }

    /// 删除员工；工序上的派工记录只是编号引用，保持不变
    pub async fn delete_staff(&self, staff_id: &str) -> Result<()> {
        if !self.staff.delete_staff(staff_id).await? {
            return Err(LabError::staff_not_found(staff_id));
        }
        tracing::info!("Removed staff {}", staff_id);
        Ok(())
    }

    pub async fn assignable_staff(&self, department: Department) -> Result<Vec<StaffCandidate>> {
        let staff = self.staff.list_staff(Some(department)).await?;
        let cases = self.cases.list_cases().await?;
        Ok(routing::assignable_staff(&staff, &cases, department))
    }

    /// 建议派工人选，部门内没有空闲员工时为 `None`
    pub async fn suggest_assignee(&self, department: Department) -> Result<Option<StaffCandidate>> {
        let staff = self.staff.list_staff(Some(department)).await?;
        let cases = self.cases.list_cases().await?;
        Ok(routing::suggest_assignee(&staff, &cases, department))
    }

    // ========== 看板 ==========

    pub async fn department_board(&self, department: Department) -> Result<DepartmentBoard> {
        let cases = self.cases.list_cases().await?;
        Ok(DepartmentBoard::build(department, &cases, Utc::now().date_naive()))
    }

    pub async fn overview(&self) -> Result<LabOverview> {
        let cases = self.cases.list_cases().await?;
        Ok(LabOverview::build(&cases, Utc::now().date_naive()))
    }
}
