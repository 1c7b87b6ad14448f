use std::sync::Arc;

use reqwest::Client;

use super::WeatherError;
use super::model::{UpstreamBody, WeatherSnapshot};
use crate::limiter::RateLimiter;

/// 天气查询方式
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    /// 按已知坐标查询
    Coords { latitude: f64, longitude: f64 },
    /// 由天气服务根据请求方 IP 自行定位
    AutoIp(String),
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

impl WeatherProvider {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: &str,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            limiter,
        }
    }

    fn url_for(&self, query: &WeatherQuery) -> (String, Vec<(&'static str, String)>) {
        let prefix = format!(
            "{}/api/{}/conditions/forecast/lang:EN/q",
            self.base_url, self.api_key
        );
        match query {
            WeatherQuery::Coords {
                latitude,
                longitude,
            } => (format!("{}/{},{}.json", prefix, latitude, longitude), vec![]),
            WeatherQuery::AutoIp(ip) => (
                format!("{}/autoip.json", prefix),
                vec![("geo_ip", ip.clone())],
            ),
        }
    }

    /// 查询当前天气和预报，每次调用消耗一次天气 API 额度
    pub async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, WeatherError> {
        if !self.limiter.permit() {
            return Err(WeatherError::BudgetExceeded);
        }

        let (url, params) = self.url_for(query);
        tracing::info!("getting current conditions for {:?}", query);

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }

        let bytes = response.bytes().await?;
        let body: UpstreamBody =
            serde_json::from_slice(&bytes).map_err(|e| WeatherError::Decode(e.to_string()))?;

        match body.current_observation {
            Some(current) => Ok(WeatherSnapshot {
                current,
                forecast: body.forecast,
            }),
            None => {
                let detail = body
                    .response
                    .and_then(|r| r.error)
                    .map(|e| format!("{}: {}", e.kind, e.description))
                    .unwrap_or_else(|| "response has no current_observation".to_string());
                Err(WeatherError::Api(detail))
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

    fn provider(base_url: &str, max_hits: u32) -> WeatherProvider {
        WeatherProvider::new(
            Client::new(),
            base_url,
            "test-key",
            Arc::new(RateLimiter::new("weather", max_hits, Duration::from_secs(180))),
        )
    }

    fn observation() -> serde_json::Value {
        serde_json::json!({
            "current_observation": {
                "temp_c": 12.0,
                "weather": "Overcast",
                "display_location": {"latitude": "37.38600000", "longitude": "-122.08380000", "elevation": "30.0"}
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_by_coords() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/api/test-key/conditions/forecast/lang:EN/q/37.386,-122.0838.json",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(observation()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let snapshot = provider(&mock_server.uri(), 1)
            .fetch(&WeatherQuery::Coords {
                latitude: 37.386,
                longitude: -122.0838,
            })
            .await
            .unwrap();

        assert_eq!(snapshot.current.description, "Overcast");
    }

    #[tokio::test]
    async fn test_fetch_auto_ip() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/test-key/conditions/forecast/lang:EN/q/autoip.json"))
            .and(query_param("geo_ip", "8.8.8.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(observation()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri(), 1)
            .fetch(&WeatherQuery::AutoIp("8.8.8.8".into()))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_budget_exceeded_skips_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(observation()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server.uri(), 1);
        let query = WeatherQuery::AutoIp("8.8.8.8".into());
        assert!(provider.fetch(&query).await.is_ok());
        assert!(matches!(
            provider.fetch(&query).await,
            Err(WeatherError::BudgetExceeded)
        ));
    }

    #[tokio::test]
    async fn test_in_band_error_is_api_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"error": {"type": "keynotfound", "description": "this key does not exist"}}
            })))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri(), 1)
            .fetch(&WeatherQuery::AutoIp("8.8.8.8".into()))
            .await;

        match result {
            Err(WeatherError::Api(detail)) => assert!(detail.contains("keynotfound")),
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri(), 1)
            .fetch(&WeatherQuery::AutoIp("8.8.8.8".into()))
            .await;

        assert!(matches!(result, Err(WeatherError::Status(s)) if s.as_u16() == 502));
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri(), 1)
            .fetch(&WeatherQuery::AutoIp("8.8.8.8".into()))
            .await;

        assert!(matches!(result, Err(WeatherError::Decode(_))));
    }
}
