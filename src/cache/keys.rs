/// 按地名查询时的缓存键：坐标保留四位小数
pub fn coords_key(latitude: f64, longitude: f64) -> String {
    format!("{:.4},{:.4}", latitude, longitude)
}

/// 把缓存键转换成单一、安全的文件名
///
/// 只保留字母数字和 `.,-_`，其余字符替换成 `_`，不会产生 `..` 之类的路径。
pub fn file_name(key: &str) -> String {
    let name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        format!("_{}", name)
    } else {
        name
    }
}
