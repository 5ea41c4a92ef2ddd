//! 页面执行器 - 基础设施层
//!
//! 只暴露"导航、等待、查找、点击、读取"这组机械能力，
//! 不包含任何重试或时序策略，那些属于提取流程。

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// 元素定位器（XPath 表达式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator(String);

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xpath={}", self.0)
    }
}

/// 执行器错误
#[derive(Debug, Clone, Error)]
pub enum ActuatorError {
    /// 在超时时间内元素没有出现
    #[error("等待元素超时 ({waited:?}): {locator}")]
    Timeout { locator: String, waited: Duration },
    /// 元素在查找和使用之间已经脱离文档
    #[error("元素已失效: {context}")]
    StaleReference { context: String },
    /// 立即查找时元素不存在
    #[error("元素不存在: {locator}")]
    NotFound { locator: String },
    /// 底层浏览器会话错误
    #[error("浏览器会话错误: {0}")]
    Browser(String),
}

impl ActuatorError {
    pub fn is_stale(&self) -> bool {
        matches!(self, ActuatorError::StaleReference { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ActuatorError::Timeout { .. })
    }
}

pub type ActuatorResult<T> = Result<T, ActuatorError>;

/// 页面上的一个元素句柄
#[async_trait]
pub trait PageElement: Send + Sync {
    /// 元素的可见文本
    async fn text(&self) -> ActuatorResult<String>;

    /// 读取属性，属性不存在时返回 `None`
    async fn attribute(&self, name: &str) -> ActuatorResult<Option<String>>;

    async fn click(&self) -> ActuatorResult<()>;

    /// 向输入框键入文本
    async fn send_keys(&self, text: &str) -> ActuatorResult<()>;
}

/// 一个独占的浏览器会话
///
/// 提取流程拿到的每个会话都必须在所有退出路径上调用 [`PageActuator::teardown`]。
#[async_trait]
pub trait PageActuator: Send + Sync {
    type Element: PageElement;

    async fn navigate(&self, url: &str) -> ActuatorResult<()>;

    /// 等待元素出现
    async fn await_present(&self, locator: &Locator, timeout: Duration) -> ActuatorResult<Self::Element>;

    /// 等待元素出现且可以点击
    async fn await_clickable(&self, locator: &Locator, timeout: Duration) -> ActuatorResult<Self::Element>;

    /// 当前所有匹配元素，没有匹配时返回空列表
    async fn find_all(&self, locator: &Locator) -> ActuatorResult<Vec<Self::Element>>;

    /// 无条件释放底层会话
    async fn teardown(self);
}

/// 会话工厂：每个来源 worker 独占一个会话，不共享、不复用
#[async_trait]
pub trait SessionLauncher: Send + Sync + 'static {
    type Actuator: PageActuator + 'static;

    async fn launch(&self) -> ActuatorResult<Self::Actuator>;
}
