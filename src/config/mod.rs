use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_IPINFO_URL: &str = "http://ipinfo.io";
const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_WUNDER_URL: &str = "http://api.wunderground.com";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub wu_key: String,
    pub server_host: String,
    pub server_port: u16,
    pub resp_dir: PathBuf,
    pub static_dir: PathBuf,
    pub state_dir: PathBuf,
    pub log_file: PathBuf,
    pub cache_max_age_secs: u64,
    pub weather_max_hits: u32,
    pub weather_window_secs: u64,
    pub maps_max_hits: u32,
    pub maps_window_secs: u64,
    pub upstream_timeout_secs: u64,
    pub ipinfo_url: String,
    pub geocode_url: String,
    pub maps_key: Option<String>,
    pub wunder_url: String,
}

/// 读取可选环境变量，缺失或无法解析时使用默认值
///
/// 配置在日志初始化之前加载，解析失败的提示先收集起来，由调用方稍后输出。
#[derive(Debug, Default)]
struct EnvReader {
    warnings: Vec<String>,
}

impl EnvReader {
    fn get<T: FromStr>(&mut self, name: &str, default: T) -> T {
        self.parse(name, env::var(name).ok(), default)
    }

    fn parse<T: FromStr>(&mut self, name: &str, raw: Option<String>, default: T) -> T {
        let Some(raw) = raw else {
            return default;
        };
        raw.trim().parse().unwrap_or_else(|_| {
            self.warnings
                .push(format!("Invalid value for {}: {:?}, using default", name, raw));
            default
        })
    }
}

impl Config {
    /// 使用默认值构造配置，只需要提供天气 API key
    pub fn new(wu_key: impl Into<String>) -> Self {
        Config {
            wu_key: wu_key.into(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8001,
            resp_dir: PathBuf::from("resp"),
            static_dir: PathBuf::from("static"),
            state_dir: PathBuf::from("."),
            log_file: PathBuf::from("wunder.log"),
            cache_max_age_secs: 60 * 60,
            weather_max_hits: 1,
            weather_window_secs: 3 * 60,
            maps_max_hits: 1,
            maps_window_secs: 60,
            upstream_timeout_secs: 10,
            ipinfo_url: DEFAULT_IPINFO_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            maps_key: None,
            wunder_url: DEFAULT_WUNDER_URL.to_string(),
        }
    }

    /// 返回配置以及无法解析、已回退为默认值的变量提示
    pub fn from_env() -> Result<(Self, Vec<String>), env::VarError> {
        dotenv::dotenv().ok();

        let defaults = Config::new(env::var("WU_KEY")?);
        let mut vars = EnvReader::default();
        let config = Config {
            server_host: vars.get("SERVER_HOST", defaults.server_host.clone()),
            server_port: vars.get("SERVER_PORT", defaults.server_port),
            resp_dir: vars.get("RESP_DIR", defaults.resp_dir.clone()),
            static_dir: vars.get("STATIC_DIR", defaults.static_dir.clone()),
            state_dir: vars.get("STATE_DIR", defaults.state_dir.clone()),
            log_file: vars.get("LOG_FILE", defaults.log_file.clone()),
            cache_max_age_secs: vars.get("CACHE_MAX_AGE", defaults.cache_max_age_secs),
            weather_max_hits: vars.get("WEATHER_MAX_HITS", defaults.weather_max_hits),
            weather_window_secs: vars.get("WEATHER_WINDOW", defaults.weather_window_secs),
            maps_max_hits: vars.get("MAPS_MAX_HITS", defaults.maps_max_hits),
            maps_window_secs: vars.get("MAPS_WINDOW", defaults.maps_window_secs),
            upstream_timeout_secs: vars.get("UPSTREAM_TIMEOUT", defaults.upstream_timeout_secs),
            ipinfo_url: vars.get("IPINFO_URL", defaults.ipinfo_url.clone()),
            geocode_url: vars.get("GEOCODE_URL", defaults.geocode_url.clone()),
            maps_key: env::var("MAPS_KEY").ok().filter(|k| !k.trim().is_empty()),
            wunder_url: vars.get("WUNDER_URL", defaults.wunder_url.clone()),
            ..defaults
        };
        Ok((config, vars.warnings))
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    pub fn weather_window(&self) -> Duration {
        Duration::from_secs(self.weather_window_secs)
    }

    pub fn maps_window(&self) -> Duration {
        Duration::from_secs(self.maps_window_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn weather_state_file(&self) -> PathBuf {
        self.state_dir.join("ts-wunder.json")
    }

    pub fn maps_state_file(&self) -> PathBuf {
        self.state_dir.join("ts-maps.json")
    }
}
