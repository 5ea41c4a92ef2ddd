use crate::error::RosterError;
use crate::models::roster::Roster;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 名单提供者：每次调用都返回当前名单的不可变快照
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn load(&self) -> Result<Roster, RosterError>;
}

/// 磁盘上的 JSON 名单文件，不做任何缓存
#[derive(Debug, Clone)]
pub struct JsonRosterFile {
    path: PathBuf,
}

impl JsonRosterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RosterProvider for JsonRosterFile {
    async fn load(&self) -> Result<Roster, RosterError> {
        let path_str = self.path.display().to_string();
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| RosterError::ReadFailed {
                path: path_str.clone(),
                source,
            })?;

        let roster: Roster = serde_json::from_str(&content).map_err(|source| RosterError::ParseFailed {
            path: path_str.clone(),
            source,
        })?;

        debug!("名单已加载: {} 个审阅人 ({})", roster.reviewers.len(), path_str);
        Ok(roster)
    }
}

/// 内存中的固定名单
#[async_trait]
impl RosterProvider for Roster {
    async fn load(&self) -> Result<Roster, RosterError> {
        Ok(self.clone())
    }
}
