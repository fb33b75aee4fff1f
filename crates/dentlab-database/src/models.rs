//! 数据库模型

use chrono::{DateTime, NaiveDate, Utc};
use dentlab_core::models::*;
use dentlab_core::{LabError, Result};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// 数据库表模型 - 使用FromRow trait用于SQL查询；枚举存储为字符串

/// 数据库病例表
#[derive(Debug, FromRow)]
pub struct DbCase {
    pub id: Uuid,
    pub case_id: String,
    pub doctor: String,
    pub patient: String,
    pub category: String,
    pub attributes: Json<CaseAttributes>,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub workflow: Json<Vec<WorkflowStep>>,
    pub current_stage_index: i32,
    pub is_paused: bool,
    pub pause_history: Json<Vec<PauseRecord>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbCase> for Case {
    type Error = LabError;

    fn try_from(row: DbCase) -> Result<Self> {
        let current_stage_index = usize::try_from(row.current_stage_index).map_err(|_| {
            LabError::Database(format!(
                "case {} has negative stage index {}",
                row.case_id, row.current_stage_index
            ))
        })?;

        Ok(Case {
            id: row.id,
            category: row.category.parse()?,
            priority: row.priority.parse()?,
            status: row.status.parse()?,
            case_id: row.case_id,
            doctor: row.doctor,
            patient: row.patient,
            attributes: row.attributes.0,
            due_date: row.due_date,
            instructions: row.instructions,
            workflow: row.workflow.0,
            current_stage_index,
            is_paused: row.is_paused,
            pause_history: row.pause_history.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 数据库员工表
#[derive(Debug, FromRow)]
pub struct DbStaff {
    pub id: Uuid,
    pub staff_id: String,
    pub name: String,
    pub department: String,
    pub role: String,
    pub status: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbStaff> for Staff {
    type Error = LabError;

    fn try_from(row: DbStaff) -> Result<Self> {
        Ok(Staff {
            id: row.id,
            department: row.department.parse()?,
            role: row.role.parse()?,
            status: row.status.parse()?,
            staff_id: row.staff_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 数据库备注表
#[derive(Debug, FromRow)]
pub struct DbCaseNote {
    pub id: Uuid,
    pub case_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbCaseNote> for CaseNote {
    fn from(row: DbCaseNote) -> Self {
        CaseNote {
            id: row.id,
            case_id: row.case_id,
            author: row.author,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// 数据库附件表
#[derive(Debug, FromRow)]
pub struct DbFileAttachment {
    pub id: Uuid,
    pub case_id: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub url: String,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<DbFileAttachment> for FileAttachment {
    fn from(row: DbFileAttachment) -> Self {
        FileAttachment {
            id: row.id,
            case_id: row.case_id,
            file_name: row.file_name,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            url: row.url,
            uploaded_by: row.uploaded_by,
            uploaded_at: row.uploaded_at,
        }
    }
}
