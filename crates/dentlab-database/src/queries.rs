//! 数据库查询操作
//!
//! 每个操作只执行一条语句，不开启跨表事务，也不重试

use crate::connection::DatabasePool;
use crate::models::*;
use async_trait::async_trait;
use dentlab_core::{
    Case, CaseLogRepository, CaseNote, CaseRepository, Department, FileAttachment, LabError,
    Result, Staff, StaffRepository,
};
use sqlx::types::Json;

/// 数据库查询操作接口
#[derive(Debug, Clone)]
pub struct DatabaseQueries {
    pool: DatabasePool,
}

impl DatabaseQueries {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        // 创建病例表，流程、暂停记录和类别属性以JSONB保存
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS cases (
                id UUID PRIMARY KEY,
                case_id VARCHAR(64) UNIQUE NOT NULL,
                doctor VARCHAR(255) NOT NULL,
                patient VARCHAR(255) NOT NULL,
                category VARCHAR(32) NOT NULL,
                attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
                priority VARCHAR(16) NOT NULL DEFAULT 'normal',
                due_date DATE,
                instructions TEXT,
                workflow JSONB NOT NULL,
                current_stage_index INTEGER NOT NULL DEFAULT 0,
                is_paused BOOLEAN NOT NULL DEFAULT FALSE,
                pause_history JSONB NOT NULL DEFAULT '[]'::jsonb,
                status VARCHAR(16) NOT NULL DEFAULT 'active',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await?;

        // 创建员工表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS staff (
                id UUID PRIMARY KEY,
                staff_id VARCHAR(64) UNIQUE NOT NULL,
                name VARCHAR(255) NOT NULL,
                department VARCHAR(32) NOT NULL,
                role VARCHAR(32) NOT NULL,
                status VARCHAR(16) NOT NULL DEFAULT 'active',
                phone VARCHAR(64),
                email VARCHAR(255),
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await?;

        // 创建备注表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS case_notes (
                id UUID PRIMARY KEY,
                case_id VARCHAR(64) NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
                author VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await?;

        // 创建附件表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS case_attachments (
                id UUID PRIMARY KEY,
                case_id VARCHAR(64) NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
                file_name VARCHAR(512) NOT NULL,
                content_type VARCHAR(128),
                size_bytes BIGINT NOT NULL DEFAULT 0,
                url VARCHAR(1024) NOT NULL,
                uploaded_by VARCHAR(255),
                uploaded_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await?;

        // 创建索引以优化查询性能
        self.create_indexes().await?;

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 创建数据库索引
    async fn create_indexes(&self) -> Result<()> {
        let pool = self.pool.pool();

        let indexes = vec![
            "CREATE INDEX IF NOT EXISTS idx_cases_created_at ON cases(created_at DESC)",
            "CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status)",
            "CREATE INDEX IF NOT EXISTS idx_staff_department ON staff(department)",
            "CREATE INDEX IF NOT EXISTS idx_case_notes_case_id ON case_notes(case_id)",
            "CREATE INDEX IF NOT EXISTS idx_case_attachments_case_id ON case_attachments(case_id)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql).execute(pool).await?;
        }

        tracing::info!("Database indexes created successfully");
        Ok(())
    }
}

fn stage_index(case: &Case) -> Result<i32> {
    i32::try_from(case.current_stage_index)
        .map_err(|_| LabError::Validation(format!("stage index out of range for {}", case.case_id)))
}

#[async_trait]
impl CaseRepository for DatabaseQueries {
    async fn list_cases(&self) -> Result<Vec<Case>> {
        let rows = sqlx::query_as::<_, DbCase>("SELECT * FROM cases ORDER BY created_at DESC")
            .fetch_all(self.pool.pool())
            .await?;

        rows.into_iter().map(Case::try_from).collect()
    }

    async fn get_case(&self, case_id: &str) -> Result<Option<Case>> {
        let row = sqlx::query_as::<_, DbCase>("SELECT * FROM cases WHERE case_id = $1")
            .bind(case_id)
            .fetch_optional(self.pool.pool())
            .await?;

        row.map(Case::try_from).transpose()
    }

    async fn insert_case(&self, case: &Case) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO cases (id, case_id, doctor, patient, category, attributes, priority, due_date,
                               instructions, workflow, current_stage_index, is_paused, pause_history,
                               status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#)
        .bind(case.id)
        .bind(&case.case_id)
        .bind(&case.doctor)
        .bind(&case.patient)
        .bind(case.category.as_str())
        .bind(Json(&case.attributes))
        .bind(case.priority.as_str())
        .bind(case.due_date)
        .bind(&case.instructions)
        .bind(Json(&case.workflow))
        .bind(stage_index(case)?)
        .bind(case.is_paused)
        .bind(Json(&case.pause_history))
        .bind(case.status.as_str())
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(self.pool.pool())
        .await?;

        Ok(())
    }

    async fn save_case(&self, case: &Case) -> Result<bool> {
        let result = sqlx::query(r#"
            UPDATE cases
            SET doctor = $2, patient = $3, category = $4, attributes = $5, priority = $6,
                due_date = $7, instructions = $8, workflow = $9, current_stage_index = $10,
                is_paused = $11, pause_history = $12, status = $13, updated_at = $14
            WHERE case_id = $1
        "#)
        .bind(&case.case_id)
        .bind(&case.doctor)
        .bind(&case.patient)
        .bind(case.category.as_str())
        .bind(Json(&case.attributes))
        .bind(case.priority.as_str())
        .bind(case.due_date)
        .bind(&case.instructions)
        .bind(Json(&case.workflow))
        .bind(stage_index(case)?)
        .bind(case.is_paused)
        .bind(Json(&case.pause_history))
        .bind(case.status.as_str())
        .bind(case.updated_at)
        .execute(self.pool.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_case(&self, case_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cases WHERE case_id = $1")
            .bind(case_id)
            .execute(self.pool.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StaffRepository for DatabaseQueries {
    async fn list_staff(&self, department: Option<Department>) -> Result<Vec<Staff>> {
        let rows = sqlx::query_as::<_, DbStaff>(
            "SELECT * FROM staff WHERE ($1::VARCHAR IS NULL OR department = $1) ORDER BY name",
        )
        .bind(department.map(|d| d.as_str()))
        .fetch_all(self.pool.pool())
        .await?;

        rows.into_iter().map(Staff::try_from).collect()
    }

    async fn get_staff(&self, staff_id: &str) -> Result<Option<Staff>> {
        let row = sqlx::query_as::<_, DbStaff>("SELECT * FROM staff WHERE staff_id = $1")
            .bind(staff_id)
            .fetch_optional(self.pool.pool())
            .await?;

        row.map(Staff::try_from).transpose()
    }

    async fn insert_staff(&self, staff: &Staff) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO staff (id, staff_id, name, department, role, status, phone, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#)
        .bind(staff.id)
        .bind(&staff.staff_id)
        .bind(&staff.name)
        .bind(staff.department.as_str())
        .bind(staff.role.as_str())
        .bind(staff.status.as_str())
        .bind(&staff.phone)
        .bind(&staff.email)
        .bind(staff.created_at)
        .bind(staff.updated_at)
        .execute(self.pool.pool())
        .await?;

        Ok(())
    }

    async fn save_staff(&self, staff: &Staff) -> Result<bool> {
        let result = sqlx::query(r#"
            UPDATE staff
            SET name = $2, department = $3, role = $4, status = $5, phone = $6, email = $7, updated_at = $8
            WHERE staff_id = $1
        "#)
        .bind(&staff.staff_id)
        .bind(&staff.name)
        .bind(staff.department.as_str())
        .bind(staff.role.as_str())
        .bind(staff.status.as_str())
        .bind(&staff.phone)
        .bind(&staff.email)
        .bind(staff.updated_at)
        .execute(self.pool.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_staff(&self, staff_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM staff WHERE staff_id = $1")
            .bind(staff_id)
            .execute(self.pool.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CaseLogRepository for DatabaseQueries {
    async fn append_note(&self, note: &CaseNote) -> Result<()> {
        sqlx::query(
            "INSERT INTO case_notes (id, case_id, author, content, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(note.id)
        .bind(&note.case_id)
        .bind(&note.author)
        .bind(&note.content)
        .bind(note.created_at)
        .execute(self.pool.pool())
        .await?;

        Ok(())
    }

    async fn list_notes(&self, case_id: &str) -> Result<Vec<CaseNote>> {
        let rows = sqlx::query_as::<_, DbCaseNote>(
            "SELECT * FROM case_notes WHERE case_id = $1 ORDER BY created_at",
        )
        .bind(case_id)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rows.into_iter().map(CaseNote::from).collect())
    }

    async fn append_attachment(&self, attachment: &FileAttachment) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO case_attachments (id, case_id, file_name, content_type, size_bytes, url, uploaded_by, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#)
        .bind(attachment.id)
        .bind(&attachment.case_id)
        .bind(&attachment.file_name)
        .bind(&attachment.content_type)
        .bind(attachment.size_bytes)
        .bind(&attachment.url)
        .bind(&attachment.uploaded_by)
        .bind(attachment.uploaded_at)
        .execute(self.pool.pool())
        .await?;

        Ok(())
    }

    async fn list_attachments(&self, case_id: &str) -> Result<Vec<FileAttachment>> {
        let rows = sqlx::query_as::<_, DbFileAttachment>(
            "SELECT * FROM case_attachments WHERE case_id = $1 ORDER BY uploaded_at",
        )
        .bind(case_id)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rows.into_iter().map(FileAttachment::from).collect())
    }
}
