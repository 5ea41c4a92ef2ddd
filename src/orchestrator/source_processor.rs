//! 单个来源处理器 - 编排层
//!
//! ## 职责
//!
//! 一个 worker 的完整生命周期：
//!
//! 1. **获取会话**：为该来源启动独占的浏览器会话
//! 2. **驱动流程**：委托 `ExtractionFlow` 跑到 `Done` / `Failed`
//! 3. **释放会话**：无论成功、失败还是 panic 都会执行 teardown
//! 4. **写入快照**：有记录则覆盖写入，没有记录则删除旧快照
//!
//! 所有错误都在这里被吸收，只以 `SourceStatus::Failed` 的形式向上报告。

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::infrastructure::{PageActuator, SessionLauncher};
use crate::models::{Record, SourceReport, SourceStatus};
use crate::services::SnapshotStore;
use crate::workflow::{ExtractionFlow, FlowOutcome, SourceCtx};

/// 单个来源的处理结果
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub report: SourceReport,
    /// 与写入快照的内容完全一致；失败或空队列时为空
    pub records: Vec<Record>,
}

impl SourceResult {
    pub fn failed(ctx: &SourceCtx, reason: impl Into<String>) -> Self {
        Self {
            report: SourceReport {
                url: ctx.url().to_string(),
                key: ctx.key.clone(),
                status: SourceStatus::Failed(reason.into()),
            },
            records: Vec::new(),
        }
    }

    fn empty(ctx: &SourceCtx) -> Self {
        Self {
            report: SourceReport {
                url: ctx.url().to_string(),
                key: ctx.key.clone(),
                status: SourceStatus::Empty,
            },
            records: Vec::new(),
        }
    }

    fn extracted(ctx: &SourceCtx, records: Vec<Record>) -> Self {
        Self {
            report: SourceReport {
                url: ctx.url().to_string(),
                key: ctx.key.clone(),
                status: SourceStatus::Extracted(records.len()),
            },
            records,
        }
    }
}

/// 处理单个来源
pub async fn process_source<L: SessionLauncher>(
    launcher: &L,
    flow: &ExtractionFlow,
    store: &SnapshotStore,
    ctx: &SourceCtx,
) -> SourceResult {
    info!("{} 开始处理: {}", ctx, ctx.url());

    let actuator = match launcher.launch().await {
        Ok(actuator) => actuator,
        Err(e) => {
            error!("{} ❌ 无法启动浏览器会话: {}", ctx, e);
            return SourceResult::failed(ctx, format!("无法启动浏览器会话: {}", e));
        }
    };

    let result = AssertUnwindSafe(flow.run(&actuator, ctx)).catch_unwind().await;
    actuator.teardown().await;

    match result {
        Ok(Ok(outcome)) => persist(store, ctx, outcome).await,
        Ok(Err(e)) => {
            error!("{} ❌ 来源处理失败: {}", ctx, e);
            SourceResult::failed(ctx, e.to_string())
        }
        Err(_) => {
            error!("{} ❌ 提取流程 panic", ctx);
            SourceResult::failed(ctx, "提取流程 panic")
        }
    }
}

/// 根据提取结果覆盖或删除快照
async fn persist(store: &SnapshotStore, ctx: &SourceCtx, outcome: FlowOutcome) -> SourceResult {
    if outcome.records.is_empty() {
        if !outcome.queue_was_empty && outcome.total_items > 0 {
            warn!(
                "{} ⚠️ {} 条记录全部提取失败，按空队列处理",
                ctx, outcome.total_items
            );
        }
        return match store.delete(&ctx.key).await {
            Ok(removed) => {
                if removed {
                    info!("{} 🗑️ 已删除过期快照: {}", ctx, ctx.key);
                }
                SourceResult::empty(ctx)
            }
            Err(e) => {
                error!("{} ❌ 删除快照失败: {}", ctx, e);
                SourceResult::failed(ctx, e.to_string())
            }
        };
    }

    match store.put(&ctx.key, &outcome.records).await {
        Ok(()) => {
            info!(
                "{} 💾 已保存 {} 条记录 -> {}",
                ctx,
                outcome.records.len(),
                store.path_for(&ctx.key).display()
            );
            SourceResult::extracted(ctx, outcome.records)
        }
        Err(e) => {
            error!("{} ❌ 写入快照失败: {}", ctx, e);
            SourceResult::failed(ctx, e.to_string())
        }
    }
}
