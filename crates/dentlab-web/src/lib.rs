//! # 技工所Web模块
//!
//! 以JSON REST接口暴露病例、工作流、员工和部门看板操作。

pub mod error;
pub mod handlers;
pub mod server;
pub mod staff;

pub use error::{ApiError, ApiJson, ApiResult};
pub use server::{create_router, AppState, WebServer};
