use axum::response::Html;
use minijinja::Environment;

use crate::error::AppError;
use crate::weather::WeatherSnapshot;

pub const FORECAST_TEMPLATE: &str = "forecast.html";

pub fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(
        FORECAST_TEMPLATE,
        include_str!("../../../templates/forecast.html"),
    )?;
    Ok(env)
}

pub fn render(env: &Environment<'static>, snapshot: &WeatherSnapshot) -> Result<Html<String>, AppError> {
    env.get_template(FORECAST_TEMPLATE)
        .and_then(|t| t.render(snapshot))
        .map(Html)
        .map_err(|e| AppError::Render(e.to_string()))
}
