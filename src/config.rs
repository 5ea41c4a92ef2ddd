use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::workflow::settle::{SettleMode, DEFAULT_QUIET_WINDOW};

/// 登录凭据（对系统而言是不透明字符串）
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 用户名或密码为空
    pub fn is_incomplete(&self) -> bool {
        self.username.is_empty() || self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的来源数量
    pub max_concurrent_sources: usize,
    /// 登录凭据
    pub credentials: Credentials,
    /// 来源列表（TOML）
    pub sources_file: PathBuf,
    /// 快照存放目录
    pub snapshot_dir: PathBuf,
    /// 审阅人名单（JSON）
    pub roster_file: PathBuf,
    /// 等待队列容器 / 打开按钮的超时时间
    pub queue_timeout: Duration,
    /// 等待弹窗字段的超时时间
    pub element_timeout: Duration,
    /// 等待 "Open Project" 链接的超时时间
    pub project_link_timeout: Duration,
    /// 登录后等待队列渲染的上限
    pub queue_settle: Duration,
    /// 打开弹窗后等待渲染的上限
    pub open_settle: Duration,
    /// 关闭弹窗后等待的上限
    pub close_settle: Duration,
    /// 等待策略：固定等待或轮询
    pub settle_mode: SettleMode,
    /// 轮询模式下，页面元素数量保持不变多久才算稳定
    pub settle_quiet: Duration,
    /// 是否使用无头浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径（为空时自动探测）
    pub chrome_executable: Option<PathBuf>,
    /// 输出日志文件
    pub output_log_file: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 15,
            credentials: Credentials::default(),
            sources_file: PathBuf::from("data/sources.toml"),
            snapshot_dir: PathBuf::from("data/assignments"),
            roster_file: PathBuf::from("data/students_per_reviewer.json"),
            queue_timeout: Duration::from_secs(20),
            element_timeout: Duration::from_secs(20),
            project_link_timeout: Duration::from_secs(10),
            queue_settle: Duration::from_millis(5000),
            open_settle: Duration::from_millis(2000),
            close_settle: Duration::from_millis(1000),
            settle_mode: SettleMode::Poll,
            settle_quiet: DEFAULT_QUIET_WINDOW,
            headless: true,
            chrome_executable: None,
            output_log_file: PathBuf::from("output.txt"),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构建配置，缺失或无法解析的值回退到默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let flag = |key: &str| lookup(key).and_then(|v| parse_flag(&v));

        Self {
            max_concurrent_sources: parsed("MAX_CONCURRENT_SOURCES")
                .map(|v| v as usize)
                .filter(|v| *v > 0)
                .unwrap_or(default.max_concurrent_sources),
            credentials: Credentials {
                username: lookup("CODIO_USERNAME").unwrap_or_default(),
                password: lookup("CODIO_PASSWORD").unwrap_or_default(),
            },
            sources_file: lookup("SOURCES_FILE").map(PathBuf::from).unwrap_or(default.sources_file),
            snapshot_dir: lookup("SNAPSHOT_DIR").map(PathBuf::from).unwrap_or(default.snapshot_dir),
            roster_file: lookup("ROSTER_FILE").map(PathBuf::from).unwrap_or(default.roster_file),
            queue_timeout: parsed("QUEUE_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or(default.queue_timeout),
            element_timeout: parsed("ELEMENT_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or(default.element_timeout),
            project_link_timeout: parsed("PROJECT_LINK_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.project_link_timeout),
            queue_settle: parsed("QUEUE_SETTLE_MS").map(Duration::from_millis).unwrap_or(default.queue_settle),
            open_settle: parsed("OPEN_SETTLE_MS").map(Duration::from_millis).unwrap_or(default.open_settle),
            close_settle: parsed("CLOSE_SETTLE_MS").map(Duration::from_millis).unwrap_or(default.close_settle),
            settle_mode: lookup("SETTLE_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.settle_mode),
            settle_quiet: parsed("SETTLE_QUIET_MS").map(Duration::from_millis).unwrap_or(default.settle_quiet),
            headless: flag("HEADLESS").unwrap_or(default.headless),
            chrome_executable: lookup("CHROME_EXECUTABLE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            output_log_file: lookup("OUTPUT_LOG_FILE").map(PathBuf::from).unwrap_or(default.output_log_file),
            verbose_logging: flag("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" => Some(false),
        _ => None,
    }
}
