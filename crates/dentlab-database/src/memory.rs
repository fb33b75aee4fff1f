//! 内存存储
//!
//! 单个实例持有病例列表、员工名册和病例日志，由 `tokio::sync::RwLock` 保护。

use async_trait::async_trait;
use dentlab_core::{
    Case, CaseLogRepository, CaseNote, CaseRepository, Department, FileAttachment, LabError,
    Result, Staff, StaffRepository,
};
use tokio::sync::RwLock;

/// 进程内存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    cases: RwLock<Vec<Case>>, // 按插入顺序
    staff: RwLock<Vec<Staff>>,
    notes: RwLock<Vec<CaseNote>>,
    attachments: RwLock<Vec<FileAttachment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 与外键约束一致：日志只能挂在现存病例上
    async fn ensure_case(&self, case_id: &str) -> Result<()> {
        let cases = self.cases.read().await;
        if cases.iter().any(|c| c.case_id == case_id) {
            Ok(())
        } else {
            Err(LabError::case_not_found(case_id))
        }
    }
}

#[async_trait]
impl CaseRepository for MemoryStore {
    async fn list_cases(&self) -> Result<Vec<Case>> {
        let cases = self.cases.read().await;
        let mut listed: Vec<Case> = cases.iter().rev().cloned().collect();
        // 稳定排序，同一时刻创建的病例保持后插入者在前
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn get_case(&self, case_id: &str) -> Result<Option<Case>> {
        let cases = self.cases.read().await;
        Ok(cases.iter().find(|c| c.case_id == case_id).cloned())
    }

    async fn insert_case(&self, case: &Case) -> Result<()> {
        let mut cases = self.cases.write().await;
        if cases.iter().any(|c| c.case_id == case.case_id) {
            return Err(LabError::Conflict(format!("case {} already exists", case.case_id)));
        }
        cases.push(case.clone());
        Ok(())
    }

    async fn save_case(&self, case: &Case) -> Result<bool> {
        let mut cases = self.cases.write().await;
        match cases.iter_mut().find(|c| c.case_id == case.case_id) {
            Some(existing) => {
                *existing = case.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_case(&self, case_id: &str) -> Result<bool> {
        let removed = {
            let mut cases = self.cases.write().await;
            let before = cases.len();
            cases.retain(|c| c.case_id != case_id);
            cases.len() != before
        };

        if removed {
            self.notes.write().await.retain(|n| n.case_id != case_id);
            self.attachments.write().await.retain(|a| a.case_id != case_id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl StaffRepository for MemoryStore {
    async fn list_staff(&self, department: Option<Department>) -> Result<Vec<Staff>> {
        let staff = self.staff.read().await;
        let mut listed: Vec<Staff> = staff
            .iter()
            .filter(|s| department.map_or(true, |d| s.department == d))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn get_staff(&self, staff_id: &str) -> Result<Option<Staff>> {
        let staff = self.staff.read().await;
        Ok(staff.iter().find(|s| s.staff_id == staff_id).cloned())
    }

    async fn insert_staff(&self, member: &Staff) -> Result<()> {
        let mut staff = self.staff.write().await;
        if staff.iter().any(|s| s.staff_id == member.staff_id) {
            return Err(LabError::Conflict(format!("staff {} already exists", member.staff_id)));
        }
        staff.push(member.clone());
        Ok(())
    }

    async fn save_staff(&self, member: &Staff) -> Result<bool> {
        let mut staff = self.staff.write().await;
        match staff.iter_mut().find(|s| s.staff_id == member.staff_id) {
            Some(existing) => {
                *existing = member.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_staff(&self, staff_id: &str) -> Result<bool> {
        let mut staff = self.staff.write().await;
        let before = staff.len();
        staff.retain(|s| s.staff_id != staff_id);
        Ok(staff.len() != before)
    }
}

#[async_trait]
impl CaseLogRepository for MemoryStore {
    async fn append_note(&self, note: &CaseNote) -> Result<()> {
        self.ensure_case(&note.case_id).await?;
        self.notes.write().await.push(note.clone());
        Ok(())
    }

    async fn list_notes(&self, case_id: &str) -> Result<Vec<CaseNote>> {
        let notes = self.notes.read().await;
        Ok(notes.iter().filter(|n| n.case_id == case_id).cloned().collect())
    }

    async fn append_attachment(&self, attachment: &FileAttachment) -> Result<()> {
        self.ensure_case(&attachment.case_id).await?;
        self.attachments.write().await.push(attachment.clone());
        Ok(())
    }

    async fn list_attachments(&self, case_id: &str) -> Result<Vec<FileAttachment>> {
        let attachments = self.attachments.read().await;
        Ok(attachments
            .iter()
            .filter(|a| a.case_id == case_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use dentlab_core::{
        CaseAttributes, CaseCategory, CasePriority, CaseStatus, StaffRole, StaffStatus, WorkflowStep,
    };
    use uuid::Uuid;

    fn case(case_id: &str, age_minutes: i64) -> Case {
        let created = Utc::now() - Duration::minutes(age_minutes);
        Case {
            id: Uuid::new_v4(),
            case_id: case_id.to_string(),
            doctor: "Dr. Haddad".to_string(),
            patient: "J. Smith".to_string(),
            category: CaseCategory::Fixed,
            attributes: CaseAttributes::default(),
            priority: CasePriority::Normal,
            due_date: None,
            instructions: None,
            workflow: vec![WorkflowStep::pending(Department::Reception)],
            current_stage_index: 0,
            is_paused: false,
            pause_history: Vec::new(),
            status: CaseStatus::Active,
            created_at: created,
            updated_at: created,
        }
    }

    fn staff(staff_id: &str, name: &str, department: Department) -> Staff {
        Staff {
            id: Uuid::new_v4(),
            staff_id: staff_id.to_string(),
            name: name.to_string(),
            department,
            role: StaffRole::Technician,
            status: StaffStatus::Active,
            phone: None,
            email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_cases_listed_newest_first() {
        let store = MemoryStore::new();
        store.insert_case(&case("CASE-old", 30)).await.unwrap();
        store.insert_case(&case("CASE-new", 1)).await.unwrap();
        store.insert_case(&case("CASE-mid", 10)).await.unwrap();

        let ids: Vec<_> = store
            .list_cases()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.case_id)
            .collect();
        assert_eq!(ids, vec!["CASE-new", "CASE-mid", "CASE-old"]);
    }

    #[tokio::test]
    async fn test_duplicate_case_id_conflicts() {
        let store = MemoryStore::new();
        store.insert_case(&case("CASE-1", 0)).await.unwrap();
        let err = store.insert_case(&case("CASE-1", 0)).await;
        assert!(matches!(err, Err(LabError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_and_delete_report_missing_rows() {
        let store = MemoryStore::new();
        let mut stored = case("CASE-1", 0);
        assert!(!store.save_case(&stored).await.unwrap());

        store.insert_case(&stored).await.unwrap();
        stored.doctor = "Dr. Nasser".to_string();
        assert!(store.save_case(&stored).await.unwrap());
        assert_eq!(
            store.get_case("CASE-1").await.unwrap().unwrap().doctor,
            "Dr. Nasser"
        );

        assert!(store.delete_case("CASE-1").await.unwrap());
        assert!(!store.delete_case("CASE-1").await.unwrap());
        assert!(store.get_case("CASE-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_case_drops_its_logs() {
        let store = MemoryStore::new();
        store.insert_case(&case("CASE-1", 0)).await.unwrap();
        store
            .append_note(&CaseNote {
                id: Uuid::new_v4(),
                case_id: "CASE-1".to_string(),
                author: "Omar".to_string(),
                content: "Check margins".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(store.list_notes("CASE-1").await.unwrap().len(), 1);

        store.delete_case("CASE-1").await.unwrap();
        assert!(store.list_notes("CASE-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logs_rejected_for_missing_case() {
        let store = MemoryStore::new();
        let note = CaseNote {
            id: Uuid::new_v4(),
            case_id: "CASE-gone".to_string(),
            author: "Omar".to_string(),
            content: "Check margins".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(store.append_note(&note).await, Err(LabError::NotFound(_))));

        let attachment = FileAttachment {
            id: Uuid::new_v4(),
            case_id: "CASE-gone".to_string(),
            file_name: "scan.stl".to_string(),
            content_type: None,
            size_bytes: 1,
            url: "s3://lab/scan.stl".to_string(),
            uploaded_by: None,
            uploaded_at: Utc::now(),
        };
        assert!(matches!(
            store.append_attachment(&attachment).await,
            Err(LabError::NotFound(_))
        ));
        assert!(store.list_notes("CASE-gone").await.unwrap().is_empty());
        assert!(store.list_attachments("CASE-gone").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_staff_filtered_by_department() {
        let store = MemoryStore::new();
        store.insert_staff(&staff("S1", "Rami", Department::Milling)).await.unwrap();
        store.insert_staff(&staff("S2", "Amal", Department::Milling)).await.unwrap();
        store.insert_staff(&staff("S3", "Dana", Department::Shipping)).await.unwrap();

        let milling = store.list_staff(Some(Department::Milling)).await.unwrap();
        let names: Vec<_> = milling.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Amal", "Rami"]);
        assert_eq!(store.list_staff(None).await.unwrap().len(), 3);
    }
}
