//! 批量来源处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，对外暴露全部逻辑操作：
//!
//! 1. **run_extraction**：并发处理所有来源，汇总结果
//! 2. **list_all_records / list_records_for_reviewer / list_unassigned_records**：对账查询
//! 3. **has_unassigned_alert**：是否存在未分配记录
//!
//! ## 设计特点
//!
//! - **并发控制**：使用 Semaphore 限制同时运行的 worker 数量
//! - **舱壁隔离**：每个 worker 独占会话，结果只通过 JoinHandle 回传，没有共享的可变集合
//! - **完成顺序**：结果按 worker 完成的先后拼接，不保证与输入顺序一致
//! - **不可取消**：每个 worker 都跑到自己的终态，编排层只负责等待

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromiumLauncher, SessionLauncher};
use crate::models::{load_sources, ExtractionReport, JsonRosterFile, Record, RosterProvider, Source};
use crate::orchestrator::source_processor::{process_source, SourceResult};
use crate::services::{Reconciler, RunLog, SnapshotStore};
use crate::workflow::{ExtractionFlow, SourceCtx};

/// 应用主结构
pub struct App<L: SessionLauncher, R: RosterProvider> {
    config: Config,
    launcher: Arc<L>,
    flow: Arc<ExtractionFlow>,
    store: SnapshotStore,
    reconciler: Reconciler<R>,
    run_log: RunLog,
}

impl App<ChromiumLauncher, JsonRosterFile> {
    /// 使用真实浏览器和磁盘名单初始化应用
    pub fn from_config(config: Config) -> Self {
        let launcher = ChromiumLauncher::new(config.headless, config.chrome_executable.clone());
        let roster = JsonRosterFile::new(config.roster_file.clone());
        Self::new(config, launcher, roster)
    }
}

impl<L: SessionLauncher, R: RosterProvider> App<L, R> {
    pub fn new(config: Config, launcher: L, roster: R) -> Self {
        let store = SnapshotStore::new(config.snapshot_dir.clone());
        Self {
            flow: Arc::new(ExtractionFlow::from_config(&config)),
            launcher: Arc::new(launcher),
            reconciler: Reconciler::new(store.clone(), roster),
            run_log: RunLog::new(config.output_log_file.clone()),
            store,
            config,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// 从来源文件加载来源并运行一次完整提取
    pub async fn run_extraction(&self) -> AppResult<ExtractionReport> {
        info!("\n📁 正在加载来源列表: {}", self.config.sources_file.display());
        let sources = load_sources(&self.config.sources_file).await?;
        Ok(self.run_sources(sources).await)
    }

    /// 并发处理给定来源；单个来源的任何失败都不会中止整次运行
    pub async fn run_sources(&self, sources: Vec<Source>) -> ExtractionReport {
        let total = sources.len();
        let mut report = ExtractionReport::default();

        if total == 0 {
            warn!("⚠️ 没有找到待处理的来源，本次运行结束");
            return report;
        }

        if self.config.credentials.is_incomplete() {
            warn!("⚠️ 用户名或密码为空，登录很可能失败");
        }

        log_startup(total, self.config.max_concurrent_sources);
        if let Err(e) = self.run_log.start(total).await {
            warn!("⚠️ 无法初始化运行日志: {}", e);
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_sources));
        let mut pending = FuturesUnordered::new();

        // 为每个来源创建独立任务
        for (idx, source) in sources.into_iter().enumerate() {
            let ctx = SourceCtx::new(source, idx + 1, total);
            let semaphore = semaphore.clone();
            let launcher = self.launcher.clone();
            let flow = self.flow.clone();
            let store = self.store.clone();
            let task_ctx = ctx.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                process_source(launcher.as_ref(), &flow, &store, &task_ctx).await
            });
            pending.push(async move { (ctx, handle.await) });
        }

        // 按完成顺序收集结果
        while let Some((ctx, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("{} 任务执行失败: {}", ctx, e);
                    SourceResult::failed(&ctx, format!("任务执行失败: {}", e))
                }
            };

            if let Err(e) = self.run_log.record_source(&result.report).await {
                warn!("⚠️ 写入运行日志失败: {}", e);
            }
            report.records.extend(result.records);
            report.sources.push(result.report);
        }

        if let Err(e) = self.run_log.finish(&report).await {
            warn!("⚠️ 写入运行日志失败: {}", e);
        }
        print_final_stats(&report, &self.run_log);

        report
    }

    /// 所有快照中的记录
    pub async fn list_all_records(&self) -> AppResult<Vec<Record>> {
        self.reconciler.all_records().await
    }

    /// 某个审阅人名下的记录，未知审阅人返回 `AppError::NotFound`
    pub async fn list_records_for_reviewer(&self, name: &str) -> AppResult<Vec<Record>> {
        self.reconciler.records_for(name).await
    }

    /// 没有审阅人认领的记录
    pub async fn list_unassigned_records(&self) -> AppResult<Vec<Record>> {
        self.reconciler.records_unassigned().await
    }

    pub async fn has_unassigned_alert(&self) -> AppResult<bool> {
        self.reconciler.has_unassigned_alert().await
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(total: usize, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始提取 - 并发来源处理模式");
    info!("✓ 找到 {} 个待处理的来源", total);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(report: &ExtractionReport, run_log: &RunLog) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.extracted_count(), report.sources.len());
    info!("○ 空队列: {}", report.empty_count());
    info!("❌ 失败: {}", report.failed_count());
    for failed in report.failed() {
        info!("   - {}", failed.url);
    }
    info!("📝 记录总数: {}", report.records.len());
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", run_log.path().display());
}
