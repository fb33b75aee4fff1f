//! # 技工所工作流模块
//!
//! 提供病例生产流程管理功能，包括：
//! - 工序状态机：约束单个工序的单向推进
//! - 流程模板：按病例类别生成固定顺序的部门流程
//! - 工作流引擎：推进、派工、暂停/恢复和结案
//! - 部门看板：各部门当前待处理病例与统计
//! - 业务服务：协调存储接口的病例与员工操作

pub mod engine;
pub mod routing;
pub mod service;
pub mod state_machine;
pub mod templates;
pub mod worklist;

// 重新导出主要类型
pub use engine::{NoOpReason, Transition, WorkflowEngine};
pub use routing::{assignable_staff, suggest_assignee, StaffCandidate};
pub use service::{CaseTransition, LabService};
pub use state_machine::{StepEvent, StepStateMachine};
pub use templates::{build_workflow, workflow_template};
pub use worklist::{DepartmentBoard, LabOverview, WorkItem, WorkListStats};
