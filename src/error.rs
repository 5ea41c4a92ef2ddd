use thiserror::Error;

/// 应用程序错误类型
///
/// 只有对账查询错误（`NotFound`）和存储层错误会越过单个来源的 worker 向调用方暴露，
/// 其余提取阶段的失败都在 worker 内部被吞掉并记录日志。
#[derive(Debug, Error)]
pub enum AppError {
    /// 审阅人不存在
    #[error("审阅人 {reviewer} 不存在")]
    NotFound { reviewer: String },
    /// 快照存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 名单读取错误
    #[error("名单错误: {0}")]
    Roster(#[from] RosterError),
    /// 来源列表读取错误
    #[error("来源列表错误: {0}")]
    Sources(#[from] SourcesError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
}

/// 快照存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 创建目录失败
    #[error("创建目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 读取目录失败
    #[error("读取目录失败 ({path}): {source}")]
    ListFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 读取快照失败
    #[error("读取快照失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入快照失败
    #[error("写入快照失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 删除快照失败
    #[error("删除快照失败 ({path}): {source}")]
    DeleteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 快照内容无法解析
    #[error("快照 JSON 解析失败 ({path}): {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 快照序列化失败
    #[error("快照序列化失败 ({key}): {source}")]
    EncodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 审阅人名单错误
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("读取名单文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("名单 JSON 解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 来源列表错误
#[derive(Debug, Error)]
pub enum SourcesError {
    #[error("读取来源文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("来源 TOML 解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 来源 URL 为空
    #[error("来源文件 {path} 第 {index} 项 URL 为空")]
    BlankUrl { path: String, index: usize },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建审阅人不存在错误
    pub fn reviewer_not_found(reviewer: impl Into<String>) -> Self {
        AppError::NotFound {
            reviewer: reviewer.into(),
        }
    }

    /// 是否为查询方可预期的"未找到"错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
