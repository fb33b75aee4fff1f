//! HTTP处理器：病例与工作流

use crate::error::{ApiJson, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use dentlab_core::{
    Case, CaseNote, CaseUpdate, Department, FileAttachment, NewCase, NewCaseNote,
    NewFileAttachment,
};
use dentlab_workflow::{CaseTransition, LabOverview};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Dental Lab Case API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "cases": "/api/cases",
            "staff": "/api/staff",
            "departments": "/api/departments"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ========== 病例 ==========

pub async fn list_cases(State(service): State<AppState>) -> ApiResult<Json<Vec<Case>>> {
    Ok(Json(service.list_cases().await?))
}

pub async fn get_case(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
) -> ApiResult<Json<Case>> {
    Ok(Json(service.get_case(&case_id).await?))
}

pub async fn create_case(
    State(service): State<AppState>,
    ApiJson(request): ApiJson<NewCase>,
) -> ApiResult<(StatusCode, Json<Case>)> {
    let case = service.create_case(request).await?;
    info!("POST /api/cases created {}", case.case_id);
    Ok((StatusCode::CREATED, Json(case)))
}

pub async fn update_case(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
    ApiJson(update): ApiJson<CaseUpdate>,
) -> ApiResult<Json<Case>> {
    Ok(Json(service.update_case(&case_id, update).await?))
}

pub async fn delete_case(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete_case(&case_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== 工作流 ==========

#[derive(Debug, Default, Deserialize)]
pub struct PauseRequest {
    pub reason: Option<String>,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub department: Department,
    pub staff_id: String,
}

pub async fn advance_case(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
) -> ApiResult<Json<CaseTransition>> {
    Ok(Json(service.advance_case(&case_id).await?))
}

pub async fn assign_staff(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
    ApiJson(request): ApiJson<AssignRequest>,
) -> ApiResult<Json<CaseTransition>> {
    let result = service
        .assign_staff(&case_id, request.department, &request.staff_id)
        .await?;
    Ok(Json(result))
}

pub async fn pause_case(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
    request: Option<ApiJson<PauseRequest>>,
) -> ApiResult<Json<CaseTransition>> {
    let request = request.map(|ApiJson(r)| r).unwrap_or_default();
    Ok(Json(
        service.pause_case(&case_id, request.reason, request.actor).await?,
    ))
}

pub async fn resume_case(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
    request: Option<ApiJson<PauseRequest>>,
) -> ApiResult<Json<CaseTransition>> {
    let actor = request.and_then(|ApiJson(r)| r.actor);
    Ok(Json(service.resume_case(&case_id, actor).await?))
}

pub async fn complete_case(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
) -> ApiResult<Json<CaseTransition>> {
    Ok(Json(service.complete_case(&case_id).await?))
}

// ========== 备注与附件 ==========

pub async fn list_notes(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
) -> ApiResult<Json<Vec<CaseNote>>> {
    Ok(Json(service.list_notes(&case_id).await?))
}

pub async fn add_note(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
    ApiJson(request): ApiJson<NewCaseNote>,
) -> ApiResult<(StatusCode, Json<CaseNote>)> {
    let note = service.add_note(&case_id, request).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_attachments(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
) -> ApiResult<Json<Vec<FileAttachment>>> {
    Ok(Json(service.list_attachments(&case_id).await?))
}

pub async fn add_attachment(
    State(service): State<AppState>,
    Path(case_id): Path<String>,
    ApiJson(request): ApiJson<NewFileAttachment>,
) -> ApiResult<(StatusCode, Json<FileAttachment>)> {
    let attachment = service.add_attachment(&case_id, request).await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn overview(State(service): State<AppState>) -> ApiResult<Json<LabOverview>> {
    Ok(Json(service.overview().await?))
}
