//! HTTP处理器：员工名册与部门

use crate::error::{ApiJson, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use dentlab_core::{Department, DepartmentInfo, LabError, NewStaff, Staff, StaffUpdate};
use dentlab_workflow::{DepartmentBoard, StaffCandidate};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StaffQueryParams {
    pub department: Option<String>,
}

fn parse_department(raw: &str) -> Result<Department, LabError> {
    raw.parse()
}

pub async fn list_staff(
    State(service): State<AppState>,
    Query(params): Query<StaffQueryParams>,
) -> ApiResult<Json<Vec<Staff>>> {
    let department = params.department.as_deref().map(parse_department).transpose()?;
    Ok(Json(service.list_staff(department).await?))
}

pub async fn get_staff(
    State(service): State<AppState>,
    Path(staff_id): Path<String>,
) -> ApiResult<Json<Staff>> {
    Ok(Json(service.get_staff(&staff_id).await?))
}

pub async fn create_staff(
    State(service): State<AppState>,
    ApiJson(request): ApiJson<NewStaff>,
) -> ApiResult<(StatusCode, Json<Staff>)> {
    let staff = service.create_staff(request).await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

pub async fn update_staff(
    State(service): State<AppState>,
    Path(staff_id): Path<String>,
    ApiJson(update): ApiJson<StaffUpdate>,
) -> ApiResult<Json<Staff>> {
    Ok(Json(service.update_staff(&staff_id, update).await?))
}

pub async fn delete_staff(
    State(service): State<AppState>,
    Path(staff_id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete_staff(&staff_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 部门映射表
pub async fn list_departments() -> Json<Vec<DepartmentInfo>> {
    Json(Department::ALL.iter().map(Department::info).collect())
}

pub async fn department_board(
    State(service): State<AppState>,
    Path(department): Path<String>,
) -> ApiResult<Json<DepartmentBoard>> {
    let department = parse_department(&department)?;
    Ok(Json(service.department_board(department).await?))
}

/// 建议人选，没有空闲员工时返回 `null`
pub async fn suggested_staff(
    State(service): State<AppState>,
    Path(department): Path<String>,
) -> ApiResult<Json<Option<StaffCandidate>>> {
    let department = parse_department(&department)?;
    Ok(Json(service.suggest_assignee(department).await?))
}

/// 派工下拉框候选人
pub async fn department_staff(
    State(service): State<AppState>,
    Path(department): Path<String>,
) -> ApiResult<Json<Vec<StaffCandidate>>> {
    let department = parse_department(&department)?;
    Ok(Json(service.assignable_staff(department).await?))
}
