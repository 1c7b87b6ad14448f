// 天气数据：上游查询、归一化、图标镜像以及整体流程编排

pub mod fetcher;
pub mod icons;
pub mod model;
pub mod normalize;
pub mod provider;

pub use fetcher::WeatherFetcher;
pub use icons::IconMirror;
pub use model::{CurrentConditions, DisplayLocation, Forecast, ForecastDay, TextForecast, WeatherSnapshot};
pub use provider::{WeatherProvider, WeatherQuery};

use reqwest::StatusCode;

/// 天气服务错误
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("API limit exceeded")]
    BudgetExceeded,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("cannot decode response: {0}")]
    Decode(String),
    #[error("provider error {0}")]
    Api(String),
}
