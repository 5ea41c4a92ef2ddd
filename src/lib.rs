//! # Grading Queue Sync
//!
//! 从第三方批改平台的动态页面中提取待批改记录，按来源持久化，
//! 并与审阅人名单对账，回答"谁该批改什么"和"哪些记录没人认领"。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器会话），只暴露能力
//! - `PageActuator` - 导航、等待、查找、点击、读取；没有任何重试策略
//! - `ChromiumActuator` - 基于 chromiumoxide 的实现，每个来源一个浏览器进程
//!
//! ### ② 业务能力层（Services）
//! - `SnapshotStore` - 按来源 URL 哈希存取快照
//! - `Reconciler` - 快照与名单对账、着色、未分配告警
//! - `RunLog` - 写运行日志
//!
//! ### ③ 流程层（Workflow）
//! - `ExtractionFlow` - 单个来源的状态机（登录 → 等待队列 → 逐条提取）
//! - `SettlePolicy` - 有上限的页面稳定等待
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - `App`，并发处理所有来源并暴露查询操作
//! - `orchestrator/source_processor` - 单个 worker：会话获取/释放与快照写入

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Credentials};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumLauncher, Locator, PageActuator, PageElement, SessionLauncher};
pub use models::{ExtractionReport, Record, Reviewer, Roster, Source, SourceKey, SourceStatus};
pub use orchestrator::App;
pub use services::{Reconciler, SnapshotStore};
pub use workflow::{ExtractionFlow, SourceCtx};
