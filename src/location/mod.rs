// 定位：按请求方 IP 或按国家/城市名解析坐标

mod model;

pub use model::ResolvedLocation;

use std::sync::Arc;

use reqwest::Client;

use crate::limiter::RateLimiter;
use model::{GeoIp, GeocodeResponse, parse_loc};

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("API limit exceeded")]
    BudgetExceeded,
    #[error("location lookup failed: {0}")]
    Lookup(String),
    #[error("no geocoding result for {0}")]
    NoResults(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(e: reqwest::Error) -> Self {
        LocationError::Lookup(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    client: Client,
    ipinfo_url: String,
    geocode_url: String,
    maps_key: Option<String>,
    maps_limiter: Arc<RateLimiter>,
}

impl LocationResolver {
    pub fn new(
        client: Client,
        ipinfo_url: &str,
        geocode_url: &str,
        maps_key: Option<String>,
        maps_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            ipinfo_url: ipinfo_url.trim_end_matches('/').to_string(),
            geocode_url: geocode_url.to_string(),
            maps_key,
            maps_limiter,
        }
    }

    /// 按 IP 定位，不受限流
    ///
    /// 失败时调用方应改用天气服务自带的 IP 定位。
    pub async fn by_identifier(&self, ip: &str) -> Result<ResolvedLocation, LocationError> {
        let url = format!("{}/{}/json", self.ipinfo_url, ip);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LocationError::Lookup(format!(
                "ip lookup returned status {}",
                response.status()
            )));
        }

        let geo: GeoIp = response.json().await?;
        let loc = geo
            .loc
            .ok_or_else(|| LocationError::Lookup(format!("no coordinates for {}", ip)))?;
        let (latitude, longitude) = parse_loc(&loc)
            .ok_or_else(|| LocationError::Lookup(format!("invalid coordinates {:?}", loc)))?;

        Ok(ResolvedLocation {
            country_code: geo.country_code,
            city: geo.city,
            latitude,
            longitude,
        })
    }

    /// 按国家和城市名解析坐标，消耗一次地图 API 额度
    pub async fn by_place_name(
        &self,
        country: &str,
        city: &str,
    ) -> Result<(f64, f64), LocationError> {
        if !self.maps_limiter.permit() {
            return Err(LocationError::BudgetExceeded);
        }

        let address = format!("{},{}", city, country);
        let mut request = self
            .client
            .get(&self.geocode_url)
            .query(&[("address", address.as_str())]);
        if let Some(key) = &self.maps_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(LocationError::Lookup(format!(
                "geocoding returned status {}",
                response.status()
            )));
        }

        let body: GeocodeResponse = response.json().await?;
        match body.results.first() {
            Some(first) => Ok((first.geometry.location.lat, first.geometry.location.lng)),
            None => {
                tracing::info!(
                    "Geocoding {} returned no results (status {:?})",
                    address,
                    body.status
                );
                Err(LocationError::NoResults(address))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(uri: &str, maps_hits: u32) -> LocationResolver {
        LocationResolver::new(
            Client::new(),
            uri,
            &format!("{}/maps/api/geocode/json", uri),
            None,
            Arc::new(RateLimiter::new("maps", maps_hits, Duration::from_secs(60))),
        )
    }

    #[tokio::test]
    async fn test_by_identifier() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/8.8.8.8/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "8.8.8.8",
                "city": "Mountain View",
                "country": "US",
                "loc": "37.3860,-122.0838"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let location = resolver(&mock_server.uri(), 1)
            .by_identifier("8.8.8.8")
            .await
            .unwrap();

        assert_eq!(location.country_code, "US");
        assert_eq!(location.city, "Mountain View");
        assert_eq!(location.latitude, 37.386);
        assert_eq!(location.longitude, -122.0838);
    }

    #[tokio::test]
    async fn test_by_identifier_without_loc_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/10.0.0.1/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ip": "10.0.0.1", "bogon": true})),
            )
            .mount(&mock_server)
            .await;

        let result = resolver(&mock_server.uri(), 1)
            .by_identifier("10.0.0.1")
            .await;

        assert!(matches!(result, Err(LocationError::Lookup(_))));
    }

    #[tokio::test]
    async fn test_by_identifier_server_error_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let result = resolver(&mock_server.uri(), 1)
            .by_identifier("8.8.8.8")
            .await;

        assert!(matches!(result, Err(LocationError::Lookup(_))));
    }

    #[tokio::test]
    async fn test_by_place_name() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .and(query_param("address", "Paris,FR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"geometry": {"location": {"lat": 48.856614, "lng": 2.3522219}}},
                    {"geometry": {"location": {"lat": 33.66, "lng": -95.55}}}
                ],
                "status": "OK"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let coords = resolver(&mock_server.uri(), 1)
            .by_place_name("FR", "Paris")
            .await
            .unwrap();

        assert_eq!(coords, (48.856614, 2.3522219));
    }

    #[tokio::test]
    async fn test_by_place_name_empty_results() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [],
                "status": "ZERO_RESULTS"
            })))
            .mount(&mock_server)
            .await;

        let result = resolver(&mock_server.uri(), 1)
            .by_place_name("XX", "Nowhere")
            .await;

        assert!(matches!(result, Err(LocationError::NoResults(_))));
    }

    #[tokio::test]
    async fn test_by_place_name_budget_exceeded_skips_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let resolver = resolver(&mock_server.uri(), 1);
        assert!(resolver.by_place_name("FR", "Paris").await.is_ok());
        assert!(matches!(
            resolver.by_place_name("FR", "Lyon").await,
            Err(LocationError::BudgetExceeded)
        ));
    }

    #[tokio::test]
    async fn test_by_place_name_sends_key_when_configured() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocode"))
            .and(query_param("key", "maps-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let resolver = LocationResolver::new(
            Client::new(),
            &mock_server.uri(),
            &format!("{}/geocode", mock_server.uri()),
            Some("maps-secret".into()),
            Arc::new(RateLimiter::new("maps", 1, Duration::from_secs(60))),
        );

        assert_eq!(resolver.by_place_name("FR", "Paris").await.unwrap(), (1.0, 2.0));
    }
}
