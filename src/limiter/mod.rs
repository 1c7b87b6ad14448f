// 上游 API 调用限流
// 每个受保护的上游 API 持有独立的固定窗口计数器

mod window;

pub use window::RateWindow;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::config::Config;

#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    window: Mutex<RateWindow>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_hits: u32, period: Duration) -> Self {
        Self::from_window(name, RateWindow::new(max_hits, period, Utc::now()))
    }

    pub fn from_window(name: &'static str, window: RateWindow) -> Self {
        Self {
            name,
            window: Mutex::new(window),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 在每次上游调用之前调用，返回 false 表示当前窗口的额度已用完
    pub fn permit(&self) -> bool {
        self.permit_at(Utc::now())
    }

    pub fn permit_at(&self, now: DateTime<Utc>) -> bool {
        let allowed = self.window.lock().hit(now);
        if !allowed {
            tracing::warn!("{} API usage limit exceeded", self.name);
        }
        allowed
    }

    pub fn snapshot(&self) -> RateWindow {
        self.window.lock().clone()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec(&self.snapshot())?;
        std::fs::write(path, json)
    }

    /// 从文件恢复窗口状态，文件缺失或损坏时静默退回到全新窗口
    pub fn load(name: &'static str, path: &Path, max_hits: u32, period: Duration) -> Self {
        let restored = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                serde_json::from_slice::<RateWindow>(&bytes).map_err(|e| e.to_string())
            })
            .and_then(|w| {
                if w.is_usable() {
                    Ok(w)
                } else {
                    Err("zero budget or period".to_string())
                }
            });

        match restored {
            Ok(window) => {
                tracing::debug!("Restored {} limiter state from {}", name, path.display());
                Self::from_window(name, window)
            }
            Err(e) => {
                tracing::info!(
                    "Starting fresh {} limiter, cannot restore {}: {}",
                    name,
                    path.display(),
                    e
                );
                Self::new(name, max_hits, period)
            }
        }
    }
}

/// 所有受保护上游 API 的限流器，启动时加载，退出时保存
#[derive(Debug, Clone)]
pub struct UpstreamLimits {
    pub weather: Arc<RateLimiter>,
    pub maps: Arc<RateLimiter>,
}

impl UpstreamLimits {
    pub fn new(config: &Config) -> Self {
        Self {
            weather: Arc::new(RateLimiter::new(
                "weather",
                config.weather_max_hits,
                config.weather_window(),
            )),
            maps: Arc::new(RateLimiter::new(
                "maps",
                config.maps_max_hits,
                config.maps_window(),
            )),
        }
    }

    pub fn load(config: &Config) -> Self {
        Self {
            weather: Arc::new(RateLimiter::load(
                "weather",
                &config.weather_state_file(),
                config.weather_max_hits,
                config.weather_window(),
            )),
            maps: Arc::new(RateLimiter::load(
                "maps",
                &config.maps_state_file(),
                config.maps_max_hits,
                config.maps_window(),
            )),
        }
    }

    pub fn save(&self, config: &Config) {
        for (limiter, path) in [
            (&self.weather, config.weather_state_file()),
            (&self.maps, config.maps_state_file()),
        ] {
            match limiter.save(&path) {
                Ok(()) => tracing::info!("Saved {} limiter to {}", limiter.name(), path.display()),
                Err(e) => tracing::error!(
                    "Failed to save {} limiter to {}: {}",
                    limiter.name(),
                    path.display(),
                    e
                ),
            }
        }
    }
}
