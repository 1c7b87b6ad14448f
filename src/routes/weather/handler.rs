use axum::{
    extract::{Path, State},
    http::Uri,
    response::Html,
};

use super::view::render;
use crate::AppState;
use crate::error::AppError;
use crate::middleware::ClientIp;

/// 爬虫探测的路径直接返回 404
pub fn is_bot_probe(path: &str) -> bool {
    path.contains(".php") || path.contains("xml") || path.contains("html")
}

#[axum::debug_handler]
pub async fn show_by_ip(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> Result<Html<String>, AppError> {
    let identity = ip.to_string();
    tracing::info!("incoming {} req /", identity);

    let snapshot = state.fetcher.by_identity(&identity).await?;
    render(&state.templates, &snapshot)
}

#[axum::debug_handler]
pub async fn show_by_place(
    State(state): State<AppState>,
    uri: Uri,
    Path((country, city)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    tracing::info!("incoming req {}", uri.path());
    if is_bot_probe(uri.path()) {
        return Err(AppError::NotFound);
    }

    let snapshot = state.fetcher.by_place(&country, &city).await?;
    render(&state.templates, &snapshot)
}

/// 其余路径：爬虫探测返回 404，其他都是格式错误的请求
pub async fn unmatched(uri: Uri) -> AppError {
    if is_bot_probe(uri.path()) {
        return AppError::NotFound;
    }
    tracing::info!("malformed req: {}", uri.path());
    AppError::MalformedRequest(uri.path().to_string())
}
