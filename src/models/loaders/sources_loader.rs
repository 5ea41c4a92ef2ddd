use crate::error::SourcesError;
use crate::models::source::Source;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    urls: Vec<String>,
}

/// 从 TOML 文件加载来源列表
///
/// 文件格式：`urls = ["https://...", ...]`。重复的 URL 只保留第一次出现，
/// 保证不会有两个 worker 写同一个快照键。
pub async fn load_sources(path: &Path) -> Result<Vec<Source>, SourcesError> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| SourcesError::ReadFailed {
            path: path_str.clone(),
            source,
        })?;

    let sources = parse_sources(&content, &path_str)?;
    info!("✓ 从 {} 加载了 {} 个来源", path_str, sources.len());
    Ok(sources)
}

/// 解析来源列表内容
pub fn parse_sources(content: &str, origin: &str) -> Result<Vec<Source>, SourcesError> {
    let file: SourcesFile = toml::from_str(content).map_err(|source| SourcesError::ParseFailed {
        path: origin.to_string(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut sources = Vec::with_capacity(file.urls.len());

    for (index, raw) in file.urls.iter().enumerate() {
        let url = raw.trim();
        if url.is_empty() {
            return Err(SourcesError::BlankUrl {
                path: origin.to_string(),
                index: index + 1,
            });
        }
        if !seen.insert(url.to_string()) {
            warn!("⚠️ 来源重复，已忽略: {}", url);
            continue;
        }
        sources.push(Source::new(url));
    }

    Ok(sources)
}
