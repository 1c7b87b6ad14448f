use std::path::PathBuf;

use reqwest::{Client, Url};

use crate::cache::write_atomic;

pub const PLACEHOLDER_ICON: &str = "/static/empty.png";
const STATIC_PREFIX: &str = "/static/";

/// 把远程天气图标下载到本地静态目录
///
/// 任何失败都不会中断请求：URL 无效时返回占位图，下载或写入失败时返回原始 URL。
#[derive(Debug, Clone)]
pub struct IconMirror {
    client: Client,
    static_dir: PathBuf,
}

impl IconMirror {
    pub fn new(client: Client, static_dir: PathBuf) -> Self {
        Self { client, static_dir }
    }

    pub async fn cache_icon(&self, icon: &str) -> String {
        let url = match Url::parse(icon) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("Invalid icon url {:?}: {}", icon, e);
                return PLACEHOLDER_ICON.to_string();
            }
        };

        let local_name = match url.path_segments().and_then(|mut s| s.next_back()) {
            Some(name) if is_safe_file_name(name) => name.to_string(),
            _ => {
                tracing::debug!("Icon url has no usable file name: {}", icon);
                return PLACEHOLDER_ICON.to_string();
            }
        };
        let local_path = self.static_dir.join(&local_name);
        let public_path = format!("{}{}", STATIC_PREFIX, local_name);

        // 已经下载过的图标直接复用，写入是原子的，存在即完整
        if tokio::fs::try_exists(&local_path).await.unwrap_or(false) {
            return public_path;
        }

        let body = match self.download(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Cannot download icon {}: {}", icon, e);
                return icon.to_string();
            }
        };

        match write_atomic(&local_path, &body).await {
            Ok(()) => {
                tracing::debug!("Mirrored icon {} to {}", icon, local_path.display());
                public_path
            }
            Err(e) => {
                tracing::warn!("Cannot store icon {}: {}", local_path.display(), e);
                icon.to_string()
            }
        }
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
