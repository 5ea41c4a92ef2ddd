use std::fmt;

use sha2::{Digest, Sha256};

/// 一个待批改队列的位置，身份即 URL 本身
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    pub url: String,
}

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// 该来源快照的存储键
    pub fn key(&self) -> SourceKey {
        SourceKey::for_url(&self.url)
    }
}

/// 由来源 URL 派生的稳定键（SHA-256 十六进制）
///
/// 同一个 URL 在不同运行之间总得到同一个键，写入因此是覆盖而不是追加。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn for_url(url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// 从已存储的文件名恢复键，只接受 64 位小写十六进制
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 64 && raw.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
