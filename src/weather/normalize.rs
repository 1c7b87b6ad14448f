use super::model::WeatherSnapshot;

/// 把上游任意精度的数字字符串格式化为两位小数，无法解析时按 0 处理
pub fn two_decimals(raw: &str) -> String {
    let value = match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        Ok(_) | Err(_) => {
            if !raw.trim().is_empty() {
                tracing::debug!("Unparseable coordinate field {:?}, using 0", raw);
            }
            0.0
        }
    };
    format!("{:.2}", value)
}

/// 统一经纬度和海拔的显示格式
pub fn normalize(snapshot: &mut WeatherSnapshot) {
    let location = &mut snapshot.current.location;
    location.latitude = two_decimals(&location.latitude);
    location.longitude = two_decimals(&location.longitude);
    location.elevation = two_decimals(&location.elevation);
}
