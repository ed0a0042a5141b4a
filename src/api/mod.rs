mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::ReconciliationService;

pub use handlers::{
    health_check, reconcile, ApiError, ErrorResponse, ReconcileRequest, ReconcileResponse,
};

/// 共享状态: 一个无状态服务, 每个请求独立运行一次处理流程
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReconciliationService>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            service: Arc::new(ReconciliationService::new(config.extraction.clone())),
        }
    }
}

/// 构建 API 路由
pub fn router(config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/reconcile", post(reconcile))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .with_state(AppState::new(config))
}
