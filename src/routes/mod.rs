pub mod site;
pub mod weather;

use axum::{Router, routing::get};
use tower_http::services::{ServeDir, ServeFile};

use crate::AppState;
use crate::middleware::log_errors;

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/robots.txt", get(site::robots))
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        .nest_service("/static", ServeDir::new(&static_dir))
        .route("/", get(weather::show_by_ip))
        .route("/{country}/{city}", get(weather::show_by_place))
        .fallback(weather::unmatched)
        .layer(axum::middleware::from_fn(log_errors));

    // 开发模式下允许所有来源跨域
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
