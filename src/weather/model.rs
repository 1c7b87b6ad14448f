use serde::{Deserialize, Deserializer, Serialize};

/// 归一化后的天气快照，同时也是缓存文件的格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "current_observation")]
    pub current: CurrentConditions,
    #[serde(default)]
    pub forecast: Forecast,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConditions {
    #[serde(rename = "temp_c")]
    pub temperature: f64,
    #[serde(rename = "feelslike_c", deserialize_with = "lenient_string")]
    pub feels_like: String,
    #[serde(rename = "relative_humidity", deserialize_with = "lenient_string")]
    pub humidity: String,
    #[serde(rename = "wind_kph")]
    pub wind_speed: f64,
    #[serde(rename = "icon_url")]
    pub icon: String,
    #[serde(rename = "observation_time")]
    pub observed_at: String,
    #[serde(rename = "weather")]
    pub description: String,
    #[serde(rename = "ob_url")]
    pub observation_url: String,
    #[serde(rename = "display_location")]
    pub location: DisplayLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayLocation {
    pub country: String,
    #[serde(deserialize_with = "lenient_string")]
    pub latitude: String,
    #[serde(deserialize_with = "lenient_string")]
    pub longitude: String,
    #[serde(deserialize_with = "lenient_string")]
    pub elevation: String,
    #[serde(rename = "full")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Forecast {
    #[serde(rename = "txt_forecast")]
    pub text: TextForecast,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextForecast {
    pub date: String,
    #[serde(rename = "forecastday")]
    pub days: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastDay {
    #[serde(rename = "icon_url")]
    pub icon: String,
    pub title: String,
    #[serde(rename = "fcttext_metric")]
    pub text: String,
}

/// 上游响应，可能是快照也可能是 `{"response": {"error": ...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct UpstreamBody {
    #[serde(default)]
    pub response: Option<UpstreamMeta>,
    #[serde(default)]
    pub current_observation: Option<CurrentConditions>,
    #[serde(default)]
    pub forecast: Forecast,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpstreamMeta {
    #[serde(default)]
    pub error: Option<UpstreamErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpstreamErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

// 上游对同一字段时而给字符串时而给数字
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(d)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}
