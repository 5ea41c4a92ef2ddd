//! 运行日志写入服务 - 业务能力层
//!
//! 只负责把每次提取运行的来源结果写进纯文本日志文件，不关心流程

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::{ExtractionReport, SourceReport, SourceStatus};

/// 运行日志写入服务
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 清空日志文件并写入表头
    pub async fn start(&self, total_sources: usize) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
        }

        let header = format!(
            "{}\n批改队列提取日志 - {}\n来源总数: {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            total_sources,
            "=".repeat(60)
        );
        fs::write(&self.path, header)
            .await
            .with_context(|| format!("无法写入日志文件: {}", self.path.display()))?;
        Ok(())
    }

    /// 追加一个来源的结果
    pub async fn record_source(&self, report: &SourceReport) -> Result<()> {
        let line = match &report.status {
            SourceStatus::Extracted(count) => format!("✓ {} | {} 条记录 | {}\n", report.url, count, report.key),
            SourceStatus::Empty => format!("○ {} | 空队列 | {}\n", report.url, report.key),
            SourceStatus::Failed(reason) => format!("✗ {} | 失败: {}\n", report.url, reason),
        };
        debug!("写入运行日志: {}", line.trim_end());
        self.append(&line).await
    }

    /// 追加汇总
    pub async fn finish(&self, report: &ExtractionReport) -> Result<()> {
        let summary = format!(
            "\n{}\n完成时间: {}\n记录: {} | 成功: {} | 空队列: {} | 失败: {}\n",
            "─".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            report.records.len(),
            report.extracted_count(),
            report.empty_count(),
            report.failed_count()
        );
        self.append(&summary).await
    }

    async fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开日志文件: {}", self.path.display()))?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKey;

    #[tokio::test]
    async fn test_writes_header_lines_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("logs/output.txt"));

        log.start(2).await.unwrap();
        let ok = SourceReport {
            url: "https://codio.example/q/1".to_string(),
            key: SourceKey::for_url("https://codio.example/q/1"),
            status: SourceStatus::Extracted(3),
        };
        let failed = SourceReport {
            url: "https://codio.example/q/2".to_string(),
            key: SourceKey::for_url("https://codio.example/q/2"),
            status: SourceStatus::Failed("等待队列容器 超时".to_string()),
        };
        log.record_source(&ok).await.unwrap();
        log.record_source(&failed).await.unwrap();
        log.finish(&ExtractionReport {
            records: Vec::new(),
            sources: vec![ok, failed],
        })
        .await
        .unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("来源总数: 2"));
        assert!(text.contains("✓ https://codio.example/q/1 | 3 条记录"));
        assert!(text.contains("✗ https://codio.example/q/2 | 失败"));
        assert!(text.contains("成功: 1 | 空队列: 0 | 失败: 1"));
    }

    #[tokio::test]
    async fn test_start_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("output.txt"));
        std::fs::write(log.path(), "old run\n").unwrap();

        log.start(0).await.unwrap();
        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(!text.contains("old run"));
    }
}
