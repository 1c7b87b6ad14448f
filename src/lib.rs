use std::sync::Arc;

use config::Config;
use error::StartupError;
use limiter::UpstreamLimits;
use minijinja::Environment;
use weather::WeatherFetcher;

pub mod cache;
pub mod config;
pub mod error;
pub mod limiter;
pub mod location;
pub mod middleware;
pub mod routes;
pub mod weather;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub fetcher: Arc<WeatherFetcher>,
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(config: Config, limits: &UpstreamLimits) -> Result<Self, StartupError> {
        let client = http_client(&config)?;
        let fetcher = WeatherFetcher::from_config(&config, client, limits);
        let templates = routes::weather::view::environment()?;

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            templates: Arc::new(templates),
        })
    }
}

/// 所有上游请求共用的 HTTP 客户端，带统一超时
pub fn http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.upstream_timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}
