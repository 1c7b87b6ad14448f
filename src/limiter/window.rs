use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个上游 API 的调用计数窗口
///
/// 字段名与旧部署写出的 `ts-*.json` 文件保持一致，`Period` 以纳秒存储。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateWindow {
    #[serde(rename = "Hits")]
    pub hits: u32,
    #[serde(rename = "Start")]
    pub start: DateTime<Utc>,
    #[serde(rename = "MaxHits")]
    pub max_hits: u32,
    #[serde(rename = "Period", with = "nanos")]
    pub period: Duration,
}

impl RateWindow {
    pub fn new(max_hits: u32, period: Duration, now: DateTime<Utc>) -> Self {
        Self {
            hits: 0,
            start: now,
            max_hits,
            period,
        }
    }

    /// 登记一次调用，返回是否放行
    ///
    /// 窗口过期时无条件重置并放行；否则计数加一，超出上限即拒绝，计数不回滚。
    pub fn hit(&mut self, now: DateTime<Utc>) -> bool {
        if self.expired(now) {
            self.start = now;
            self.hits = 1;
            return true;
        }
        self.hits = self.hits.saturating_add(1);
        self.hits <= self.max_hits
    }

    fn expired(&self, now: DateTime<Utc>) -> bool {
        // 时钟回拨时 to_std 失败，视为窗口未过期
        match (now - self.start).to_std() {
            Ok(elapsed) => elapsed > self.period,
            Err(_) => false,
        }
    }

    pub(crate) fn is_usable(&self) -> bool {
        self.max_hits > 0 && !self.period.is_zero()
    }
}

mod nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(period: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(period.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_nanos)
    }
}
