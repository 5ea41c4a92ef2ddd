//! 测试用的脚本化页面执行器
//!
//! 每个队列用 `FakeQueue` 描述页面内容；执行器在 `navigate` 时按 URL 选中队列，
//! 等待类操作不真正等待，元素不存在时立刻返回超时。

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use grading_queue_sync::infrastructure::{ActuatorError, ActuatorResult};
use grading_queue_sync::workflow::{Selectors, SettleMode};
use grading_queue_sync::{Config, Credentials, Locator, PageActuator, PageElement, SessionLauncher};

#[derive(Debug, Clone, Default)]
pub struct FakeItem {
    pub title: String,
    pub regrade: bool,
    pub completed: String,
    pub project_url: Option<String>,
    /// 读取标题时总是失败
    pub unreadable_title: bool,
    /// 重新批改标记在弹窗打开后多久才出现
    pub regrade_delay: Duration,
}

impl FakeItem {
    pub fn new(title: &str, completed: &str) -> Self {
        Self {
            title: title.to_string(),
            completed: completed.to_string(),
            ..Default::default()
        }
    }

    pub fn with_project(mut self, url: &str) -> Self {
        self.project_url = Some(url.to_string());
        self
    }

    pub fn regrade(mut self) -> Self {
        self.regrade = true;
        self
    }

    /// 重新批改标记晚于标题渲染
    pub fn regrade_after(mut self, delay: Duration) -> Self {
        self.regrade = true;
        self.regrade_delay = delay;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable_title = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeQueue {
    pub login_form: bool,
    pub queue_visible: bool,
    pub empty: bool,
    pub items: Vec<FakeItem>,
    /// 点击打开按钮时前 N 次报"元素已失效"
    pub stale_trigger_clicks: usize,
    /// 关闭按钮存在但点击失败
    pub close_broken: bool,
    /// navigate 时直接 panic
    pub panic_on_navigate: bool,
    /// navigate 时的模拟耗时
    pub latency: Duration,
    /// 打开按钮逐个渲染的间隔，为零时一次性全部出现
    pub trigger_interval: Duration,
}

impl FakeQueue {
    pub fn with_items(items: Vec<FakeItem>) -> Self {
        Self {
            login_form: true,
            queue_visible: true,
            empty: false,
            items,
            stale_trigger_clicks: 0,
            close_broken: false,
            panic_on_navigate: false,
            latency: Duration::ZERO,
            trigger_interval: Duration::ZERO,
        }
    }

    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::with_items(Vec::new())
        }
    }

    pub fn never_loads() -> Self {
        Self {
            queue_visible: false,
            ..Self::with_items(Vec::new())
        }
    }
}

#[derive(Debug, Default)]
struct PageState {
    queue: Option<FakeQueue>,
    open_item: Option<usize>,
    navigated_at: Option<Instant>,
    opened_at: Option<Instant>,
    stale_clicks_left: usize,
    typed: Vec<String>,
    login_clicked: bool,
}

/// 跨会话共享的统计
#[derive(Debug, Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub teardowns: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
}

pub struct FakeActuator {
    queues: Arc<HashMap<String, FakeQueue>>,
    selectors: Selectors,
    state: Arc<Mutex<PageState>>,
    counters: Arc<Counters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Username,
    Password,
    LoginButton,
    QueueContainer,
    EmptyMarker,
    Trigger(usize),
    Title(usize),
    Regrade,
    CompletedDate(usize),
    ProjectLink(usize),
    Close,
}

pub struct FakeElement {
    kind: Kind,
    state: Arc<Mutex<PageState>>,
}

impl FakeActuator {
    fn locate(&self, locator: &Locator) -> Vec<FakeElement> {
        let state = self.state.lock().unwrap();
        let Some(queue) = state.queue.as_ref() else {
            return Vec::new();
        };
        let s = &self.selectors;
        let open = state.open_item;

        let kinds: Vec<Kind> = if locator == &s.username_input {
            when(queue.login_form, Kind::Username)
        } else if locator == &s.password_input {
            when(queue.login_form, Kind::Password)
        } else if locator == &s.login_button {
            when(queue.login_form, Kind::LoginButton)
        } else if locator == &s.queue_container {
            when(queue.queue_visible, Kind::QueueContainer)
        } else if locator == &s.empty_queue_marker {
            when(queue.queue_visible && queue.empty, Kind::EmptyMarker)
        } else if locator == &s.grading_trigger {
            if queue.queue_visible && !queue.empty {
                let rendered = rendered_triggers(queue, state.navigated_at);
                (0..rendered).map(Kind::Trigger).collect()
            } else {
                Vec::new()
            }
        } else if locator == &s.modal_title {
            open.map(Kind::Title).into_iter().collect()
        } else if locator == &s.regrade_marker {
            let visible = open
                .map(|i| {
                    let item = &queue.items[i];
                    item.regrade && state.opened_at.is_some_and(|at| at.elapsed() >= item.regrade_delay)
                })
                .unwrap_or(false);
            when(visible, Kind::Regrade)
        } else if locator == &s.completed_date {
            open.map(Kind::CompletedDate).into_iter().collect()
        } else if locator == &s.project_link {
            open.filter(|i| queue.items[*i].project_url.is_some())
                .map(Kind::ProjectLink)
                .into_iter()
                .collect()
        } else if locator == &s.close_button {
            when(open.is_some(), Kind::Close)
        } else {
            Vec::new()
        };

        kinds
            .into_iter()
            .map(|kind| FakeElement {
                kind,
                state: self.state.clone(),
            })
            .collect()
    }

    fn first(&self, locator: &Locator) -> ActuatorResult<FakeElement> {
        self.locate(locator)
            .into_iter()
            .next()
            .ok_or_else(|| ActuatorError::Timeout {
                locator: locator.to_string(),
                waited: Duration::ZERO,
            })
    }
}

fn rendered_triggers(queue: &FakeQueue, navigated_at: Option<Instant>) -> usize {
    let total = queue.items.len();
    if queue.trigger_interval.is_zero() {
        return total;
    }
    let elapsed = navigated_at.map(|at| at.elapsed()).unwrap_or_default();
    let shown = (elapsed.as_millis() / queue.trigger_interval.as_millis()) as usize + 1;
    shown.min(total)
}

fn when(cond: bool, kind: Kind) -> Vec<Kind> {
    if cond {
        vec![kind]
    } else {
        Vec::new()
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn text(&self) -> ActuatorResult<String> {
        let state = self.state.lock().unwrap();
        let queue = state.queue.as_ref().unwrap();
        match self.kind {
            Kind::Title(i) if queue.items[i].unreadable_title => {
                Err(ActuatorError::Browser("title unreadable".to_string()))
            }
            Kind::Title(i) => Ok(queue.items[i].title.clone()),
            Kind::CompletedDate(i) => Ok(format!("Completed date: {}", queue.items[i].completed)),
            _ => Ok(String::new()),
        }
    }

    async fn attribute(&self, name: &str) -> ActuatorResult<Option<String>> {
        let state = self.state.lock().unwrap();
        let queue = state.queue.as_ref().unwrap();
        match self.kind {
            Kind::ProjectLink(i) if name == "href" => Ok(queue.items[i].project_url.clone()),
            _ => Ok(None),
        }
    }

    async fn click(&self) -> ActuatorResult<()> {
        let mut state = self.state.lock().unwrap();
        match self.kind {
            Kind::Trigger(i) => {
                if state.stale_clicks_left > 0 {
                    state.stale_clicks_left -= 1;
                    return Err(ActuatorError::StaleReference {
                        context: format!("trigger #{}", i + 1),
                    });
                }
                state.open_item = Some(i);
                state.opened_at = Some(Instant::now());
                Ok(())
            }
            Kind::Close => {
                if state.queue.as_ref().map(|q| q.close_broken).unwrap_or(false) {
                    return Err(ActuatorError::Browser("close control unresponsive".to_string()));
                }
                state.open_item = None;
                Ok(())
            }
            Kind::LoginButton => {
                state.login_clicked = true;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn send_keys(&self, text: &str) -> ActuatorResult<()> {
        self.state.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }
}

#[async_trait]
impl PageActuator for FakeActuator {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> ActuatorResult<()> {
        let queue = self
            .queues
            .get(url)
            .cloned()
            .ok_or_else(|| ActuatorError::Browser(format!("net::ERR_NAME_NOT_RESOLVED {}", url)))?;
        if queue.panic_on_navigate {
            panic!("renderer crashed");
        }
        if !queue.latency.is_zero() {
            tokio::time::sleep(queue.latency).await;
        }
        let mut state = self.state.lock().unwrap();
        state.stale_clicks_left = queue.stale_trigger_clicks;
        state.navigated_at = Some(Instant::now());
        state.queue = Some(queue);
        Ok(())
    }

    async fn await_present(&self, locator: &Locator, _timeout: Duration) -> ActuatorResult<FakeElement> {
        self.first(locator)
    }

    async fn await_clickable(&self, locator: &Locator, _timeout: Duration) -> ActuatorResult<FakeElement> {
        self.first(locator)
    }

    async fn find_all(&self, locator: &Locator) -> ActuatorResult<Vec<FakeElement>> {
        Ok(self.locate(locator))
    }

    async fn teardown(self) {
        self.counters.teardowns.fetch_add(1, Ordering::SeqCst);
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 按 URL 提供脚本化队列的会话工厂
#[derive(Clone)]
pub struct FakeLauncher {
    queues: Arc<HashMap<String, FakeQueue>>,
    pub counters: Arc<Counters>,
}

impl FakeLauncher {
    pub fn new(queues: Vec<(&str, FakeQueue)>) -> Self {
        Self {
            queues: Arc::new(queues.into_iter().map(|(u, q)| (u.to_string(), q)).collect()),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn launches(&self) -> usize {
        self.counters.launches.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.counters.teardowns.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.counters.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Actuator = FakeActuator;

    async fn launch(&self) -> ActuatorResult<FakeActuator> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_active.fetch_max(active, Ordering::SeqCst);
        Ok(FakeActuator {
            queues: self.queues.clone(),
            selectors: Selectors::default(),
            state: Arc::new(Mutex::new(PageState::default())),
            counters: self.counters.clone(),
        })
    }
}

/// 所有等待预算为零、数据落在临时目录的配置
pub fn test_config(dir: &Path) -> Config {
    Config {
        max_concurrent_sources: 4,
        credentials: Credentials::new("grader", "secret"),
        sources_file: dir.join("sources.toml"),
        snapshot_dir: dir.join("assignments"),
        roster_file: dir.join("students_per_reviewer.json"),
        queue_timeout: Duration::ZERO,
        element_timeout: Duration::ZERO,
        project_link_timeout: Duration::ZERO,
        queue_settle: Duration::ZERO,
        open_settle: Duration::ZERO,
        close_settle: Duration::ZERO,
        settle_mode: SettleMode::Fixed,
        settle_quiet: Duration::ZERO,
        headless: true,
        chrome_executable: None,
        output_log_file: dir.join("output.txt"),
        verbose_logging: false,
    }
}
