//! 基于 chromiumoxide 的页面执行器
//!
//! 每个 `ChromiumActuator` 独占一个浏览器进程和一个页面。

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, Element, Page};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::browser::launch_headless_browser;
use crate::infrastructure::actuator::{
    ActuatorError, ActuatorResult, Locator, PageActuator, PageElement, SessionLauncher,
};

/// 轮询等待元素时的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const CLICKABLE_JS: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return !this.disabled
        && rect.width > 0
        && rect.height > 0
        && style.visibility !== 'hidden'
        && style.pointerEvents !== 'none';
}"#;

/// 把 CDP 错误归类为执行器错误
///
/// Chrome 对已脱离文档的节点报 "Could not find node with given id" 或 "detached"，
/// 对查询不到的元素报 "not found"。
fn classify(err: CdpError, context: &str) -> ActuatorError {
    let message = err.to_string();
    let lower = message.to_lowercase();

    if lower.contains("node with given id")
        || lower.contains("detached")
        || lower.contains("no node found")
        || lower.contains("cannot find context with specified id")
    {
        ActuatorError::StaleReference {
            context: context.to_string(),
        }
    } else if matches!(err, CdpError::NotFound) || lower.contains("not found") || lower.contains("could not find") {
        ActuatorError::NotFound {
            locator: context.to_string(),
        }
    } else {
        ActuatorError::Browser(format!("{} ({})", message, context))
    }
}

/// chromiumoxide 元素句柄
pub struct ChromiumElement {
    element: Element,
    context: String,
}

impl ChromiumElement {
    async fn is_clickable(&self) -> ActuatorResult<bool> {
        let returns = self
            .element
            .call_js_fn(CLICKABLE_JS, false)
            .await
            .map_err(|e| classify(e, &self.context))?;
        Ok(returns.result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }
}

#[async_trait]
impl PageElement for ChromiumElement {
    async fn text(&self) -> ActuatorResult<String> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| classify(e, &self.context))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> ActuatorResult<Option<String>> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| classify(e, &self.context))
    }

    async fn click(&self) -> ActuatorResult<()> {
        self.element
            .click()
            .await
            .map_err(|e| classify(e, &self.context))?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> ActuatorResult<()> {
        self.element
            .click()
            .await
            .map_err(|e| classify(e, &self.context))?;
        self.element
            .type_str(text)
            .await
            .map_err(|e| classify(e, &self.context))?;
        Ok(())
    }
}

/// 独占一个浏览器进程的页面执行器
pub struct ChromiumActuator {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumActuator {
    pub fn new(browser: Browser, page: Page, handler: JoinHandle<()>) -> Self {
        Self {
            browser,
            page,
            handler,
        }
    }

    async fn query_one(&self, locator: &Locator) -> ActuatorResult<ChromiumElement> {
        let context = locator.to_string();
        let element = self
            .page
            .find_xpath(locator.as_str())
            .await
            .map_err(|e| classify(e, &context))?;
        Ok(ChromiumElement { element, context })
    }

    async fn poll_for(
        &self,
        locator: &Locator,
        timeout: Duration,
        require_clickable: bool,
    ) -> ActuatorResult<ChromiumElement> {
        let started = Instant::now();
        let deadline = started + timeout;

        loop {
            match self.query_one(locator).await {
                Ok(element) => {
                    if !require_clickable {
                        return Ok(element);
                    }
                    match element.is_clickable().await {
                        Ok(true) => return Ok(element),
                        Ok(false) => {}
                        Err(e) if e.is_stale() => {}
                        Err(e) => return Err(e),
                    }
                }
                Err(ActuatorError::NotFound { .. }) | Err(ActuatorError::StaleReference { .. }) => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(ActuatorError::Timeout {
                    locator: locator.to_string(),
                    waited: started.elapsed(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PageActuator for ChromiumActuator {
    type Element = ChromiumElement;

    async fn navigate(&self, url: &str) -> ActuatorResult<()> {
        debug!("导航到: {}", url);
        self.page.goto(url).await.map_err(|e| classify(e, url))?;
        Ok(())
    }

    async fn await_present(&self, locator: &Locator, timeout: Duration) -> ActuatorResult<ChromiumElement> {
        self.poll_for(locator, timeout, false).await
    }

    async fn await_clickable(&self, locator: &Locator, timeout: Duration) -> ActuatorResult<ChromiumElement> {
        self.poll_for(locator, timeout, true).await
    }

    async fn find_all(&self, locator: &Locator) -> ActuatorResult<Vec<ChromiumElement>> {
        let context = locator.to_string();
        match self.page.find_xpaths(locator.as_str()).await {
            Ok(elements) => Ok(elements
                .into_iter()
                .map(|element| ChromiumElement {
                    element,
                    context: context.clone(),
                })
                .collect()),
            Err(e) => match classify(e, &context) {
                ActuatorError::NotFound { .. } => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }

    async fn teardown(mut self) {
        if let Err(e) = self.page.close().await {
            debug!("关闭页面失败（忽略）: {}", e);
        }
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        self.handler.abort();
    }
}

/// 为每个来源启动一个全新的 Chromium 进程
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(headless: bool, executable: Option<PathBuf>) -> Self {
        Self {
            headless,
            executable,
        }
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    type Actuator = ChromiumActuator;

    async fn launch(&self) -> ActuatorResult<ChromiumActuator> {
        let (browser, page, handler) = launch_headless_browser(self.headless, self.executable.as_deref())
            .await
            .map_err(|e| ActuatorError::Browser(e.to_string()))?;
        Ok(ChromiumActuator::new(browser, page, handler))
    }
}
