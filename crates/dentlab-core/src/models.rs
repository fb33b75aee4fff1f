//! 核心数据模型定义

use crate::error::{LabError, Result};
use crate::utils::is_valid_fdi_tooth;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 生产部门
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Reception,      // 收件登记
    ModelRoom,      // 模型室
    CadDesign,      // CAD设计
    Milling,        // 切削
    Ceramics,       // 上瓷
    WaxSetup,       // 排牙蜡型
    Acrylic,        // 树脂充胶
    Orthodontics,   // 正畸制作
    QualityControl, // 质检
    Shipping,       // 发货
}

/// 部门展示信息
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DepartmentInfo {
    pub department: Department,
    pub label: &'static str,
    pub icon: &'static str,
}

impl Department {
    pub const ALL: [Department; 10] = [
        Department::Reception,
        Department::ModelRoom,
        Department::CadDesign,
        Department::Milling,
        Department::Ceramics,
        Department::WaxSetup,
        Department::Acrylic,
        Department::Orthodontics,
        Department::QualityControl,
        Department::Shipping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Reception => "reception",
            Department::ModelRoom => "model_room",
            Department::CadDesign => "cad_design",
            Department::Milling => "milling",
            Department::Ceramics => "ceramics",
            Department::WaxSetup => "wax_setup",
            Department::Acrylic => "acrylic",
            Department::Orthodontics => "orthodontics",
            Department::QualityControl => "quality_control",
            Department::Shipping => "shipping",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Department::Reception => "Reception",
            Department::ModelRoom => "Model Room",
            Department::CadDesign => "CAD Design",
            Department::Milling => "Milling",
            Department::Ceramics => "Ceramics",
            Department::WaxSetup => "Wax Setup",
            Department::Acrylic => "Acrylic Processing",
            Department::Orthodontics => "Orthodontic Fabrication",
            Department::QualityControl => "Quality Control",
            Department::Shipping => "Shipping",
        }
    }

    /// 前端图标名称
    pub fn icon(&self) -> &'static str {
        match self {
            Department::Reception => "inbox",
            Department::ModelRoom => "box",
            Department::CadDesign => "monitor",
            Department::Milling => "cog",
            Department::Ceramics => "palette",
            Department::WaxSetup => "flame",
            Department::Acrylic => "droplet",
            Department::Orthodontics => "smile",
            Department::QualityControl => "check-circle",
            Department::Shipping => "truck",
        }
    }

    pub fn info(&self) -> DepartmentInfo {
        DepartmentInfo {
            department: *self,
            label: self.label(),
            icon: self.icon(),
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        Department::ALL
            .iter()
            .find(|d| d.as_str() == s)
            .copied()
            .ok_or_else(|| LabError::Validation(format!("unknown department: {}", s)))
    }
}

/// 病例类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseCategory {
    Fixed,        // 固定修复
    Removable,    // 活动修复
    Orthodontics, // 正畸
}

impl CaseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::Fixed => "fixed",
            CaseCategory::Removable => "removable",
            CaseCategory::Orthodontics => "orthodontics",
        }
    }
}

impl FromStr for CaseCategory {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed" => Ok(CaseCategory::Fixed),
            "removable" => Ok(CaseCategory::Removable),
            "orthodontics" => Ok(CaseCategory::Orthodontics),
            other => Err(LabError::Validation(format!("unknown case category: {}", other))),
        }
    }
}

/// 病例优先级，按紧急程度递增排列
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum CasePriority {
    #[default]
    Normal,
    Rush,
    Emergency,
}

impl CasePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePriority::Normal => "normal",
            CasePriority::Rush => "rush",
            CasePriority::Emergency => "emergency",
        }
    }
}

impl FromStr for CasePriority {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(CasePriority::Normal),
            "rush" => Ok(CasePriority::Rush),
            "emergency" => Ok(CasePriority::Emergency),
            other => Err(LabError::Validation(format!("unknown priority: {}", other))),
        }
    }
}

/// 病例最终状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Active,
    Completed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Active => "active",
            CaseStatus::Completed => "completed",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(CaseStatus::Active),
            "completed" => Ok(CaseStatus::Completed),
            other => Err(LabError::Validation(format!("unknown case status: {}", other))),
        }
    }
}

/// 工序状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// 印模类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImpressionType {
    Physical,
    DigitalScan,
}

/// 牙弓
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    Upper,
    Lower,
    Both,
}

/// 夜磨牙垫尺寸
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NightGuardSize {
    Small,
    Medium,
    Large,
}

/// 类别相关的病例属性，整体以结构化数据存储
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseAttributes {
    pub restoration_type: Option<String>, // 冠/桥/贴面等
    pub material: Option<String>,
    pub impression_type: Option<ImpressionType>,
    pub shade: Option<String>,
    #[serde(default)]
    pub teeth: Vec<u8>, // FDI牙位
    pub appliance_type: Option<String>,
    pub arch: Option<Arch>,
    pub night_guard_size: Option<NightGuardSize>,
}

impl CaseAttributes {
    pub fn validate(&self) -> Result<()> {
        if let Some(tooth) = self.teeth.iter().find(|t| !is_valid_fdi_tooth(**t)) {
            return Err(LabError::Validation(format!("invalid tooth number: {}", tooth)));
        }
        Ok(())
    }
}

/// 工序（病例流程中的一个部门阶段）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    pub department: Department,
    pub status: StepStatus,
    pub assigned_staff: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowStep {
    pub fn pending(department: Department) -> Self {
        Self {
            department,
            status: StepStatus::Pending,
            assigned_staff: None,
            started_at: None,
            completed_at: None,
        }
    }
}

/// 暂停/恢复动作
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PauseAction {
    Paused,
    Resumed,
}

/// 暂停记录，只追加不修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PauseRecord {
    pub action: PauseAction,
    pub department: Option<Department>,
    pub reason: Option<String>,
    pub actor: Option<String>,
    pub at: DateTime<Utc>,
}

/// 病例
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub id: Uuid,
    pub case_id: String,
    pub doctor: String,
    pub patient: String,
    pub category: CaseCategory,
    pub attributes: CaseAttributes,
    pub priority: CasePriority,
    pub due_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub workflow: Vec<WorkflowStep>,
    pub current_stage_index: usize,
    pub is_paused: bool,
    pub pause_history: Vec<PauseRecord>,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// 当前处于进行中的工序
    pub fn in_progress_step(&self) -> Option<(usize, &WorkflowStep)> {
        self.workflow
            .iter()
            .enumerate()
            .find(|(_, step)| step.status == StepStatus::InProgress)
    }

    /// 第一个未完成的工序
    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.workflow.get(self.current_stage_index)
    }

    pub fn current_department(&self) -> Option<Department> {
        self.current_step().map(|step| step.department)
    }

    pub fn step_for(&self, department: Department) -> Option<&WorkflowStep> {
        self.workflow.iter().find(|step| step.department == department)
    }

    /// 第一个未完成工序的下标，全部完成时等于工序数
    pub fn first_open_index(&self) -> usize {
        self.workflow
            .iter()
            .position(|step| step.status != StepStatus::Completed)
            .unwrap_or(self.workflow.len())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == CaseStatus::Active && self.due_date.map_or(false, |due| due < today)
    }
}

/// 新建病例请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCase {
    #[serde(default)]
    pub case_id: Option<String>,
    pub doctor: String,
    pub patient: String,
    pub category: CaseCategory,
    #[serde(default)]
    pub attributes: CaseAttributes,
    #[serde(default)]
    pub priority: CasePriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl NewCase {
    pub fn validate(&self) -> Result<()> {
        require_text("doctor", &self.doctor, MAX_NAME_LEN)?;
        require_text("patient", &self.patient, MAX_NAME_LEN)?;
        if let Some(case_id) = &self.case_id {
            require_text("case_id", case_id, MAX_ID_LEN)?;
        }
        self.attributes.validate()
    }
}

/// 病例部分更新，未给出的字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseUpdate {
    pub doctor: Option<String>,
    pub patient: Option<String>,
    pub attributes: Option<CaseAttributes>,
    pub priority: Option<CasePriority>,
    pub due_date: Option<NaiveDate>,
    pub instructions: Option<String>,
}

impl CaseUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(doctor) = &self.doctor {
            require_text("doctor", doctor, MAX_NAME_LEN)?;
        }
        if let Some(patient) = &self.patient {
            require_text("patient", patient, MAX_NAME_LEN)?;
        }
        if let Some(attributes) = &self.attributes {
            attributes.validate()?;
        }
        Ok(())
    }

    pub fn apply_to(self, case: &mut Case) {
        if let Some(doctor) = self.doctor {
            case.doctor = doctor;
        }
        if let Some(patient) = self.patient {
            case.patient = patient;
        }
        if let Some(attributes) = self.attributes {
            case.attributes = attributes;
        }
        if let Some(priority) = self.priority {
            case.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            case.due_date = Some(due_date);
        }
        if let Some(instructions) = self.instructions {
            case.instructions = Some(instructions);
        }
        case.updated_at = Utc::now();
    }
}

/// 员工角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    #[default]
    Technician,
    SeniorTechnician,
    Supervisor,
    Manager,
    Receptionist,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Technician => "technician",
            StaffRole::SeniorTechnician => "senior_technician",
            StaffRole::Supervisor => "supervisor",
            StaffRole::Manager => "manager",
            StaffRole::Receptionist => "receptionist",
        }
    }
}

impl FromStr for StaffRole {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "technician" => Ok(StaffRole::Technician),
            "senior_technician" => Ok(StaffRole::SeniorTechnician),
            "supervisor" => Ok(StaffRole::Supervisor),
            "manager" => Ok(StaffRole::Manager),
            "receptionist" => Ok(StaffRole::Receptionist),
            other => Err(LabError::Validation(format!("unknown staff role: {}", other))),
        }
    }
}

/// 员工在岗状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    #[default]
    Active,
    Busy,
    Offline,
}

impl StaffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStatus::Active => "active",
            StaffStatus::Busy => "busy",
            StaffStatus::Offline => "offline",
        }
    }
}

impl FromStr for StaffStatus {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(StaffStatus::Active),
            "busy" => Ok(StaffStatus::Busy),
            "offline" => Ok(StaffStatus::Offline),
            other => Err(LabError::Validation(format!("unknown staff status: {}", other))),
        }
    }
}

/// 员工
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Staff {
    pub id: Uuid,
    pub staff_id: String,
    pub name: String,
    pub department: Department,
    pub role: StaffRole,
    pub status: StaffStatus,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建员工请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    #[serde(default)]
    pub staff_id: Option<String>,
    pub name: String,
    pub department: Department,
    #[serde(default)]
    pub role: StaffRole,
    #[serde(default)]
    pub status: StaffStatus,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl NewStaff {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        if let Some(staff_id) = &self.staff_id {
            require_text("staff_id", staff_id, MAX_ID_LEN)?;
        }
        limit_len("phone", self.phone.as_deref(), MAX_PHONE_LEN)?;
        limit_len("email", self.email.as_deref(), MAX_NAME_LEN)
    }
}

/// 员工部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffUpdate {
    pub name: Option<String>,
    pub department: Option<Department>,
    pub role: Option<StaffRole>,
    pub status: Option<StaffStatus>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl StaffUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_text("name", name, MAX_NAME_LEN)?;
        }
        limit_len("phone", self.phone.as_deref(), MAX_PHONE_LEN)?;
        limit_len("email", self.email.as_deref(), MAX_NAME_LEN)
    }

    pub fn apply_to(self, staff: &mut Staff) {
        if let Some(name) = self.name {
            staff.name = name;
        }
        if let Some(department) = self.department {
            staff.department = department;
        }
        if let Some(role) = self.role {
            staff.role = role;
        }
        if let Some(status) = self.status {
            staff.status = status;
        }
        if let Some(phone) = self.phone {
            staff.phone = Some(phone);
        }
        if let Some(email) = self.email {
            staff.email = Some(email);
        }
        staff.updated_at = Utc::now();
    }
}

/// 病例备注
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseNote {
    pub id: Uuid,
    pub case_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCaseNote {
    pub author: String,
    pub content: String,
}

impl NewCaseNote {
    pub fn validate(&self) -> Result<()> {
        require_text("author", &self.author, MAX_NAME_LEN)?;
        if self.content.trim().is_empty() {
            return Err(LabError::Validation("content is required".to_string()));
        }
        Ok(())
    }
}

/// 病例附件元数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileAttachment {
    pub id: Uuid,
    pub case_id: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub url: String,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileAttachment {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: i64,
    pub url: String,
    #[serde(default)]
    pub uploaded_by: Option<String>,
}

impl NewFileAttachment {
    pub fn validate(&self) -> Result<()> {
        require_text("file_name", &self.file_name, MAX_FILE_NAME_LEN)?;
        require_text("url", &self.url, MAX_URL_LEN)?;
        limit_len("content_type", self.content_type.as_deref(), MAX_CONTENT_TYPE_LEN)?;
        limit_len("uploaded_by", self.uploaded_by.as_deref(), MAX_NAME_LEN)?;
        if self.size_bytes < 0 {
            return Err(LabError::Validation("size_bytes must not be negative".to_string()));
        }
        Ok(())
    }
}

// 文本字段长度上限，与数据库列宽一致
pub const MAX_ID_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 64;
pub const MAX_CONTENT_TYPE_LEN: usize = 128;
pub const MAX_FILE_NAME_LEN: usize = 512;
pub const MAX_URL_LEN: usize = 1024;

fn require_text(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LabError::Validation(format!("{} is required", field)));
    }
    limit_len(field, Some(value), max_len)
}

fn limit_len(field: &str, value: Option<&str>, max_len: usize) -> Result<()> {
    match value {
        Some(value) if value.chars().count() > max_len => Err(LabError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        ))),
        _ => Ok(()),
    }
}
