//! 编排层（Orchestration）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量来源处理器
//! - 对外暴露提取和对账的全部操作（`App`）
//! - 控制并发数量（Semaphore）
//! - 按完成顺序汇总各来源结果，写运行日志
//!
//! ### `source_processor` - 单个来源处理器
//! - 获取 / 释放独占的浏览器会话
//! - 委托 `ExtractionFlow` 驱动状态机
//! - 覆盖写入或删除该来源的快照
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Source>)
//!     ↓
//! source_processor (处理单个 Source)
//!     ↓
//! workflow::ExtractionFlow (状态机)
//!     ↓
//! infrastructure (PageActuator)
//! ```

pub mod batch_processor;
pub mod source_processor;

pub use batch_processor::App;
pub use source_processor::{process_source, SourceResult};
