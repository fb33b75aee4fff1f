//! Web服务器

use axum::{
    routing::{get, post},
    Router,
};
use dentlab_core::Result;
use dentlab_workflow::LabService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    add_attachment, add_note, advance_case, api_root, assign_staff, complete_case, create_case,
    delete_case, get_case, health, list_attachments, list_cases, list_notes, overview, pause_case,
    resume_case, update_case,
};
use crate::staff::{
    create_staff, delete_staff, department_board, department_staff, get_staff, list_departments,
    list_staff, suggested_staff, update_staff,
};

/// 处理器共享状态
pub type AppState = Arc<LabService>;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, service: AppState, permissive_cors: bool) -> Self {
        let mut app = create_router(service);
        if permissive_cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        Self { addr, app }
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}

/// 完整路由
pub fn create_router(service: AppState) -> Router {
    Router::new()
        // 根路径
        .route("/", get(api_root))
        // 健康检查
        .route("/health", get(health))
        // API路由
        .nest("/api", api_routes())
        .with_state(service)
        // 全局中间件
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// API 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/cases", get(list_cases).post(create_case))
        .route(
            "/cases/:case_id",
            get(get_case).put(update_case).delete(delete_case),
        )
        .route("/cases/:case_id/advance", post(advance_case))
        .route("/cases/:case_id/assign", post(assign_staff))
        .route("/cases/:case_id/pause", post(pause_case))
        .route("/cases/:case_id/resume", post(resume_case))
        .route("/cases/:case_id/complete", post(complete_case))
        .route("/cases/:case_id/notes", get(list_notes).post(add_note))
        .route(
            "/cases/:case_id/attachments",
            get(list_attachments).post(add_attachment),
        )
        .route("/staff", get(list_staff).post(create_staff))
        .route(
            "/staff/:staff_id",
            get(get_staff).put(update_staff).delete(delete_staff),
        )
        .route("/departments", get(list_departments))
        .route("/departments/:department/board", get(department_board))
        .route("/departments/:department/staff", get(department_staff))
        .route("/departments/:department/suggested", get(suggested_staff))
}
