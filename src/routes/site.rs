use axum::{http::header, response::IntoResponse};

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

pub async fn robots() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], ROBOTS_TXT)
}
