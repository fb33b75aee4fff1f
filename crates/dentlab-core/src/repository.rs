//! 存储接口
//!
//! 内存存储与PostgreSQL存储都实现这些trait，上层服务只依赖trait对象。
//! 所有写操作都是单条记录、单表的；并发写同一病例时后写者覆盖先写者。

use crate::error::Result;
use crate::models::{Case, CaseNote, Department, FileAttachment, Staff};
use async_trait::async_trait;

/// 病例存储
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// 全部病例，按创建时间倒序
    async fn list_cases(&self) -> Result<Vec<Case>>;

    async fn get_case(&self, case_id: &str) -> Result<Option<Case>>;

    /// 插入新病例，业务编号重复时返回 `LabError::Conflict`
    async fn insert_case(&self, case: &Case) -> Result<()>;

    /// 整体覆盖保存，病例不存在时返回 `false`
    async fn save_case(&self, case: &Case) -> Result<bool>;

    /// 删除病例，不存在时返回 `false`
    async fn delete_case(&self, case_id: &str) -> Result<bool>;
}

/// 员工名册
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// 按姓名排序，可按部门过滤
    async fn list_staff(&self, department: Option<Department>) -> Result<Vec<Staff>>;

    async fn get_staff(&self, staff_id: &str) -> Result<Option<Staff>>;

    async fn insert_staff(&self, staff: &Staff) -> Result<()>;

    async fn save_staff(&self, staff: &Staff) -> Result<bool>;

    async fn delete_staff(&self, staff_id: &str) -> Result<bool>;
}

/// 病例备注与附件日志，只追加
#[async_trait]
pub trait CaseLogRepository: Send + Sync {
    async fn append_note(&self, note: &CaseNote) -> Result<()>;

    /// 按时间正序
    async fn list_notes(&self, case_id: &str) -> Result<Vec<CaseNote>>;

    async fn append_attachment(&self, attachment: &FileAttachment) -> Result<()>;

    async fn list_attachments(&self, case_id: &str) -> Result<Vec<FileAttachment>>;
}
