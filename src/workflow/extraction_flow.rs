//! 单个来源的提取流程 - 流程层
//!
//! 核心职责：把一个待批改队列从导航、登录一路驱动到逐条提取，最终得到记录列表。
//!
//! 状态顺序：
//! 1. Start → LoggingIn：导航到来源 URL，提交凭据（登录失败只记日志，不中止）
//! 2. LoggingIn → AwaitingQueue：有限时间内等待队列容器
//! 3. AwaitingQueue → EmptyQueue | IteratingItems：空队列标记 / 固定下来的条目数
//! 4. IteratingItems → ItemOpen → ItemExtracted → ItemClosed → IteratingItems ...
//! 5. Done
//!
//! 所有的"元素已失效"重试、等待预算都在这里，执行器本身不做任何重试。
//! 单个条目失败只跳过该条目；返回 `Err` 即该来源进入 `Failed`。

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, Credentials};
use crate::infrastructure::{ActuatorError, ActuatorResult, Locator, PageActuator, PageElement};
use crate::models::Record;
use crate::workflow::selectors::{Selectors, PROJECT_LINK_ATTRIBUTE};
use crate::workflow::settle::{SettleCondition, SettlePolicy};
use crate::workflow::source_ctx::SourceCtx;
use crate::workflow::title::{split_modal_title, strip_completed_date};

/// 提取流程的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Start,
    LoggingIn,
    AwaitingQueue,
    EmptyQueue,
    IteratingItems { next: usize, total: usize },
    ItemOpen { index: usize, total: usize },
    ItemExtracted { index: usize, total: usize },
    ItemClosed { index: usize, total: usize },
    Done,
    Failed,
}

/// 来源级别的提取错误，出现即表示该来源失败
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 导航到来源失败
    #[error("导航到 {url} 失败: {source}")]
    Navigation {
        url: String,
        #[source]
        source: ActuatorError,
    },
    /// 关键元素在预算内没有出现
    #[error("{step} 超时: {source}")]
    Timeout {
        step: &'static str,
        #[source]
        source: ActuatorError,
    },
    /// 重试一次后元素仍然失效
    #[error("{step} 元素重试后仍失效: {source}")]
    StaleReference {
        step: &'static str,
        #[source]
        source: ActuatorError,
    },
    /// 单个条目的字段无法读取（只影响该条目）
    #[error("字段 {field} 提取失败: {reason}")]
    FieldExtractionFailure { field: &'static str, reason: String },
    /// 关闭详情弹窗失败，后续条目无法继续
    #[error("关闭第 {index} 条的详情弹窗失败: {source}")]
    CloseFailed {
        index: usize,
        #[source]
        source: ActuatorError,
    },
    /// 其他浏览器错误
    #[error("{step} 失败: {source}")]
    Actuator {
        step: &'static str,
        #[source]
        source: ActuatorError,
    },
}

impl ExtractionError {
    fn at_step(step: &'static str, source: ActuatorError) -> Self {
        match source {
            ActuatorError::Timeout { .. } => ExtractionError::Timeout { step, source },
            ActuatorError::StaleReference { .. } => ExtractionError::StaleReference { step, source },
            other => ExtractionError::Actuator { step, source: other },
        }
    }

    fn field(field: &'static str, source: ActuatorError) -> Self {
        ExtractionError::FieldExtractionFailure {
            field,
            reason: source.to_string(),
        }
    }
}

/// 一个来源跑到 `Done` 后的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowOutcome {
    pub records: Vec<Record>,
    /// 队列显示了空队列标记
    pub queue_was_empty: bool,
    /// 枚举时固定下来的条目数
    pub total_items: usize,
    /// 被跳过的条目数
    pub skipped_items: usize,
}

/// 等待预算
#[derive(Debug, Clone, Copy)]
pub struct FlowSettings {
    pub queue_timeout: Duration,
    pub element_timeout: Duration,
    pub project_link_timeout: Duration,
    pub queue_settle: SettlePolicy,
    pub open_settle: SettlePolicy,
    pub close_settle: SettlePolicy,
}

impl FlowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue_timeout: config.queue_timeout,
            element_timeout: config.element_timeout,
            project_link_timeout: config.project_link_timeout,
            queue_settle: SettlePolicy::new(config.settle_mode, config.queue_settle).with_quiet(config.settle_quiet),
            open_settle: SettlePolicy::new(config.settle_mode, config.open_settle).with_quiet(config.settle_quiet),
            close_settle: SettlePolicy::new(config.settle_mode, config.close_settle).with_quiet(config.settle_quiet),
        }
    }
}

/// 在"元素已失效"时重新执行一次（重新查找元素），第二次的结果原样返回
async fn retry_stale<T, F, Fut>(step: &str, mut op: F) -> ActuatorResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ActuatorResult<T>>,
{
    match op().await {
        Err(e) if e.is_stale() => {
            debug!("{} 元素已失效，重新查找一次", step);
            op().await
        }
        other => other,
    }
}

/// 单个来源的提取流程
///
/// - 不持有任何资源（会话由调用方获取和释放）
/// - 条目之间严格串行：打开 → 提取 → 关闭
pub struct ExtractionFlow {
    selectors: Selectors,
    settings: FlowSettings,
    credentials: Credentials,
}

impl ExtractionFlow {
    pub fn new(selectors: Selectors, settings: FlowSettings, credentials: Credentials) -> Self {
        Self {
            selectors,
            settings,
            credentials,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Selectors::default(),
            FlowSettings::from_config(config),
            config.credentials.clone(),
        )
    }

    /// 驱动一个来源直到 `Done`，出错即 `Failed`
    pub async fn run<A: PageActuator>(&self, actuator: &A, ctx: &SourceCtx) -> Result<FlowOutcome, ExtractionError> {
        let result = self.drive(actuator, ctx).await;
        if let Err(e) = &result {
            debug!("{} 状态 -> {:?}: {}", ctx, ExtractionState::Failed, e);
        }
        result
    }

    async fn drive<A: PageActuator>(&self, actuator: &A, ctx: &SourceCtx) -> Result<FlowOutcome, ExtractionError> {
        let mut outcome = FlowOutcome::default();
        let mut state = ExtractionState::Start;

        loop {
            let next = match state {
                ExtractionState::Start => {
                    actuator
                        .navigate(ctx.url())
                        .await
                        .map_err(|source| ExtractionError::Navigation {
                            url: ctx.url().to_string(),
                            source,
                        })?;
                    ExtractionState::LoggingIn
                }
                ExtractionState::LoggingIn => {
                    if let Err(e) = self.login(actuator).await {
                        warn!("{} ⚠️ 登录失败，继续等待队列: {}", ctx, e);
                    }
                    ExtractionState::AwaitingQueue
                }
                ExtractionState::AwaitingQueue => self.await_queue(actuator, ctx).await?,
                ExtractionState::EmptyQueue => {
                    info!("{} 队列为空", ctx);
                    outcome.queue_was_empty = true;
                    ExtractionState::Done
                }
                ExtractionState::IteratingItems { next, total } => {
                    outcome.total_items = total;
                    if next >= total {
                        ExtractionState::Done
                    } else {
                        debug!("{} 处理第 {}/{} 条", ctx, next + 1, total);
                        match self.open_item(actuator, next).await {
                            Ok(()) => ExtractionState::ItemOpen { index: next, total },
                            Err(e) => {
                                warn!("{} ⚠️ 第 {} 条无法打开，跳过: {}", ctx, next + 1, e);
                                outcome.skipped_items += 1;
                                ExtractionState::IteratingItems { next: next + 1, total }
                            }
                        }
                    }
                }
                ExtractionState::ItemOpen { index, total } => {
                    match self.extract_item(actuator).await {
                        Ok(record) => {
                            debug!(
                                "{} ✓ {} / {}{}",
                                ctx,
                                record.student_name,
                                record.assignment_name,
                                if record.is_regrade { " (重新批改)" } else { "" }
                            );
                            outcome.records.push(record);
                        }
                        Err(e) => {
                            warn!("{} ⚠️ 第 {} 条提取失败，跳过: {}", ctx, index + 1, e);
                            outcome.skipped_items += 1;
                        }
                    }
                    ExtractionState::ItemExtracted { index, total }
                }
                ExtractionState::ItemExtracted { index, total } => {
                    self.close_item(actuator, index).await?;
                    ExtractionState::ItemClosed { index, total }
                }
                ExtractionState::ItemClosed { index, total } => ExtractionState::IteratingItems { next: index + 1, total },
                ExtractionState::Done | ExtractionState::Failed => break,
            };

            debug!("{} 状态 {:?} -> {:?}", ctx, state, next);
            state = next;
        }

        info!(
            "{} ✅ 提取完成: {} 条记录, 跳过 {} 条",
            ctx,
            outcome.records.len(),
            outcome.skipped_items
        );
        Ok(outcome)
    }

    /// 填写用户名、密码并点击登录按钮
    async fn login<A: PageActuator>(&self, actuator: &A) -> ActuatorResult<()> {
        let timeout = self.settings.queue_timeout;
        let selectors = &self.selectors;
        let credentials = &self.credentials;

        retry_stale("用户名输入框", || async move {
            let input = actuator.await_present(&selectors.username_input, timeout).await?;
            input.send_keys(&credentials.username).await
        })
        .await?;

        retry_stale("密码输入框", || async move {
            let input = actuator.await_present(&selectors.password_input, timeout).await?;
            input.send_keys(&credentials.password).await
        })
        .await?;

        retry_stale("登录按钮", || async move {
            let button = actuator.await_clickable(&selectors.login_button, timeout).await?;
            button.click().await
        })
        .await
    }

    /// 等待队列出现，判断是空队列还是固定条目数
    async fn await_queue<A: PageActuator>(&self, actuator: &A, ctx: &SourceCtx) -> Result<ExtractionState, ExtractionError> {
        let timeout = self.settings.queue_timeout;
        let selectors = &self.selectors;

        retry_stale("队列容器", || async move {
            actuator.await_present(&selectors.queue_container, timeout).await.map(|_| ())
        })
        .await
        .map_err(|e| ExtractionError::at_step("等待队列容器", e))?;

        // 队列内容异步渲染：等空队列标记或打开按钮出现，且按钮数量不再增长
        let markers = [selectors.empty_queue_marker.clone(), selectors.grading_trigger.clone()];
        self.settings
            .queue_settle
            .settle(
                actuator,
                SettleCondition::Rendered {
                    ready: &markers,
                    watch: &[],
                },
            )
            .await;

        let empty = actuator
            .find_all(&selectors.empty_queue_marker)
            .await
            .map_err(|e| ExtractionError::at_step("查找空队列标记", e))?;
        if !empty.is_empty() {
            return Ok(ExtractionState::EmptyQueue);
        }

        retry_stale("打开按钮", || async move {
            actuator.await_present(&selectors.grading_trigger, timeout).await.map(|_| ())
        })
        .await
        .map_err(|e| ExtractionError::at_step("等待打开按钮", e))?;

        // 条目数在这里固定下来，之后按索引重新查找，不再以实时列表为界
        let total = actuator
            .find_all(&selectors.grading_trigger)
            .await
            .map_err(|e| ExtractionError::at_step("枚举打开按钮", e))?
            .len();
        info!("{} 📋 发现 {} 条待批改记录", ctx, total);

        Ok(ExtractionState::IteratingItems { next: 0, total })
    }

    /// 点击第 `index` 个打开按钮并等待弹窗渲染
    async fn open_item<A: PageActuator>(&self, actuator: &A, index: usize) -> ActuatorResult<()> {
        let trigger = &self.selectors.grading_trigger;

        retry_stale("打开按钮", || async move {
            let button = actuator
                .find_all(trigger)
                .await?
                .into_iter()
                .nth(index)
                .ok_or_else(|| ActuatorError::NotFound {
                    locator: format!("{} #{}", trigger, index + 1),
                })?;
            button.click().await
        })
        .await?;

        // 重新批改标记可能晚于标题出现，一并观察
        let selectors = &self.selectors;
        let details = [
            selectors.regrade_marker.clone(),
            selectors.completed_date.clone(),
            selectors.project_link.clone(),
        ];
        self.settings
            .open_settle
            .settle(
                actuator,
                SettleCondition::Rendered {
                    ready: std::slice::from_ref(&selectors.modal_title),
                    watch: &details,
                },
            )
            .await;
        Ok(())
    }

    /// 按顺序读取：标题 → 重新批改标记 → 完成日期 → 项目链接
    async fn extract_item<A: PageActuator>(&self, actuator: &A) -> Result<Record, ExtractionError> {
        let selectors = &self.selectors;

        let title = self.read_text(actuator, &selectors.modal_title, "title").await?;
        let (student_name, assignment_name) = split_modal_title(&title);
        if student_name.is_empty() {
            return Err(ExtractionError::FieldExtractionFailure {
                field: "student_name",
                reason: format!("标题 '{}' 中没有学生名", title.trim()),
            });
        }

        let is_regrade = !actuator
            .find_all(&selectors.regrade_marker)
            .await
            .map_err(|e| ExtractionError::field("regrade", e))?
            .is_empty();

        let date_text = self.read_text(actuator, &selectors.completed_date, "completed_date").await?;
        let completed_date = strip_completed_date(&date_text);

        let project_url = self.read_project_url(actuator).await;

        Ok(Record::new(
            student_name,
            assignment_name,
            completed_date,
            project_url,
            is_regrade,
        ))
    }

    async fn read_text<A: PageActuator>(
        &self,
        actuator: &A,
        locator: &Locator,
        field: &'static str,
    ) -> Result<String, ExtractionError> {
        let timeout = self.settings.element_timeout;
        retry_stale(field, || async move {
            let element = actuator.await_present(locator, timeout).await?;
            element.text().await
        })
        .await
        .map_err(|e| ExtractionError::field(field, e))
    }

    /// "Open Project" 链接缺失不是错误
    async fn read_project_url<A: PageActuator>(&self, actuator: &A) -> Option<String> {
        let timeout = self.settings.project_link_timeout;
        let link = &self.selectors.project_link;

        let found = retry_stale("project_url", || async move {
            let element = actuator.await_present(link, timeout).await?;
            element.attribute(PROJECT_LINK_ATTRIBUTE).await
        })
        .await;

        match found {
            Ok(Some(href)) if !href.trim().is_empty() => Some(href.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                if !e.is_timeout() {
                    debug!("读取项目链接失败，视为无链接: {}", e);
                }
                None
            }
        }
    }

    /// 关闭详情弹窗；弹窗根本没打开时直接跳过
    async fn close_item<A: PageActuator>(&self, actuator: &A, index: usize) -> Result<(), ExtractionError> {
        let timeout = self.settings.element_timeout;
        let close_button = &self.selectors.close_button;

        let modal_open = actuator
            .find_all(close_button)
            .await
            .map(|found| !found.is_empty())
            .unwrap_or(true);
        if !modal_open {
            debug!("第 {} 条的弹窗未打开，无需关闭", index + 1);
            return Ok(());
        }

        retry_stale("关闭按钮", || async move {
            let button = actuator.await_clickable(close_button, timeout).await?;
            button.click().await
        })
        .await
        .map_err(|source| ExtractionError::CloseFailed {
            index: index + 1,
            source,
        })?;

        self.settings
            .close_settle
            .settle(actuator, SettleCondition::Absent(&self.selectors.modal_title))
            .await;
        Ok(())
    }
}
