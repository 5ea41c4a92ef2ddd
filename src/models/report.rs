use serde::Serialize;

use crate::models::record::Record;
use crate::models::source::SourceKey;

/// 单个来源本次运行的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SourceStatus {
    /// 提取到记录并已写入快照
    Extracted(usize),
    /// 队列为空（或全部条目被跳过），旧快照已删除
    Empty,
    /// 来源失败，不贡献任何记录
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub url: String,
    #[serde(serialize_with = "serialize_key")]
    pub key: SourceKey,
    #[serde(flatten)]
    pub status: SourceStatus,
}

fn serialize_key<S: serde::Serializer>(key: &SourceKey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(key.as_str())
}

/// 一次完整提取运行的结果
///
/// `records` 按 worker 完成顺序拼接，调用方不能依赖跨来源的顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub records: Vec<Record>,
    pub sources: Vec<SourceReport>,
}

impl ExtractionReport {
    pub fn failed(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Failed(_)))
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn empty_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.status == SourceStatus::Empty)
            .count()
    }

    pub fn extracted_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Extracted(_)))
            .count()
    }
}
