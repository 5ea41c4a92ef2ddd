//! 来源处理上下文
//!
//! 封装"我正在处理第几个来源、它的 URL 和快照键"这一信息

use std::fmt::Display;

use crate::models::{Source, SourceKey};

/// 来源处理上下文
#[derive(Debug, Clone)]
pub struct SourceCtx {
    /// 来源索引（从1开始，仅用于日志显示）
    pub source_index: usize,

    /// 本次运行的来源总数
    pub total_sources: usize,

    /// 来源
    pub source: Source,

    /// 快照键
    pub key: SourceKey,
}

impl SourceCtx {
    /// 创建新的来源上下文
    pub fn new(source: Source, source_index: usize, total_sources: usize) -> Self {
        let key = source.key();
        Self {
            source_index,
            total_sources,
            source,
            key,
        }
    }

    pub fn url(&self) -> &str {
        &self.source.url
    }
}

impl Display for SourceCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[来源 {}/{}]", self.source_index, self.total_sources)
    }
}
