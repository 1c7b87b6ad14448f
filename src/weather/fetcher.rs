use std::sync::Arc;

use reqwest::Client;

use crate::cache::{SnapshotCache, keys};
use crate::config::Config;
use crate::error::AppError;
use crate::limiter::UpstreamLimits;
use crate::location::LocationResolver;

use super::icons::IconMirror;
use super::model::WeatherSnapshot;
use super::normalize::normalize;
use super::provider::{WeatherProvider, WeatherQuery};

/// 天气查询流程：缓存 → 定位 → 限流 → 上游 → 归一化 → 写缓存
///
/// 上游请求成功并归一化之前的任何失败都不会改动缓存。
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    cache: SnapshotCache,
    resolver: LocationResolver,
    provider: WeatherProvider,
    icons: IconMirror,
}

impl WeatherFetcher {
    pub fn new(
        cache: SnapshotCache,
        resolver: LocationResolver,
        provider: WeatherProvider,
        icons: IconMirror,
    ) -> Self {
        Self {
            cache,
            resolver,
            provider,
            icons,
        }
    }

    pub fn from_config(config: &Config, client: Client, limits: &UpstreamLimits) -> Self {
        Self::new(
            SnapshotCache::new(config.resp_dir.clone(), config.cache_max_age()),
            LocationResolver::new(
                client.clone(),
                &config.ipinfo_url,
                &config.geocode_url,
                config.maps_key.clone(),
                Arc::clone(&limits.maps),
            ),
            WeatherProvider::new(
                client.clone(),
                &config.wunder_url,
                &config.wu_key,
                Arc::clone(&limits.weather),
            ),
            IconMirror::new(client, config.static_dir.clone()),
        )
    }

    /// 按国家/城市查询
    ///
    /// 缓存键依赖坐标，所以地理编码先于缓存检查，命中时只消耗地图 API 额度。
    pub async fn by_place(&self, country: &str, city: &str) -> Result<WeatherSnapshot, AppError> {
        let (latitude, longitude) = self
            .resolver
            .by_place_name(country, city)
            .await
            .inspect_err(|e| tracing::info!("cannot locate {} {}: {}", country, city, e))?;

        let key = keys::coords_key(latitude, longitude);
        if let Some(snapshot) = self.cache.lookup(&key).await {
            return Ok(snapshot);
        }

        let query = WeatherQuery::Coords {
            latitude,
            longitude,
        };
        self.refresh(&key, &query).await
    }

    /// 按请求方 IP 查询
    ///
    /// IP 定位失败时改由天气服务自行定位，两种方式都只消耗一次天气 API 额度。
    pub async fn by_identity(&self, identity: &str) -> Result<WeatherSnapshot, AppError> {
        if let Some(snapshot) = self.cache.lookup(identity).await {
            return Ok(snapshot);
        }

        let query = match self.resolver.by_identifier(identity).await {
            Ok(location) => {
                tracing::info!(
                    "getting current conditions (ipinfo) for {}: {}, {}",
                    identity,
                    location.city,
                    location.country_code
                );
                WeatherQuery::Coords {
                    latitude: location.latitude,
                    longitude: location.longitude,
                }
            }
            Err(e) => {
                tracing::info!(
                    "getting current conditions (autoip) for {}: {}",
                    identity,
                    e
                );
                WeatherQuery::AutoIp(identity.to_string())
            }
        };

        self.refresh(identity, &query).await
    }

    async fn refresh(&self, key: &str, query: &WeatherQuery) -> Result<WeatherSnapshot, AppError> {
        let mut snapshot = self
            .provider
            .fetch(query)
            .await
            .inspect_err(|e| tracing::warn!("weather fetch for {} failed: {}", key, e))?;

        normalize(&mut snapshot);
        self.mirror_icons(&mut snapshot).await;
        self.cache.store(key, &snapshot).await;

        Ok(snapshot)
    }

    async fn mirror_icons(&self, snapshot: &mut WeatherSnapshot) {
        snapshot.current.icon = self.icons.cache_icon(&snapshot.current.icon).await;
        for day in snapshot.forecast.text.days.iter_mut() {
            day.icon = self.icons.cache_icon(&day.icon).await;
        }
    }
}
