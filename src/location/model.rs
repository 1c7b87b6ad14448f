use serde::{Deserialize, Serialize};

/// 定位结果，构造后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub country_code: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// ipinfo.io 的响应
#[derive(Debug, Deserialize)]
pub(crate) struct GeoIp {
    #[serde(rename = "country", default)]
    pub country_code: String,
    #[serde(default)]
    pub city: String,
    // "lat,lon"
    #[serde(default)]
    pub loc: Option<String>,
}

/// 地理编码接口的响应
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

pub(crate) fn parse_loc(loc: &str) -> Option<(f64, f64)> {
    let (lat, lon) = loc.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    let valid = lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon);
    valid.then_some((lat, lon))
}
