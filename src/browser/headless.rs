use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::error::BrowserError;

/// 启动一个独立的浏览器进程并打开空白页
///
/// 返回的事件处理任务必须和浏览器一起释放。
pub async fn launch_headless_browser(
    headless: bool,
    executable: Option<&Path>,
) -> Result<(Browser, Page, JoinHandle<()>)> {
    debug!("🚀 启动浏览器 (无头: {})", headless);

    let mut builder = BrowserConfig::builder();
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = executable {
        builder = builder.chrome_executable(path);
    }

    let config = builder
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",             // 禁用沙盒，防止容器内权限问题导致的崩溃
            "--disable-dev-shm-usage",  // 防止共享内存不足
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            BrowserError::ConfigurationFailed(e)
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed { source: e }
    })?;

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = match browser.new_page("about:blank").await {
        Ok(page) => page,
        Err(e) => {
            error!("创建页面失败: {}", e);
            // 浏览器已经启动，这里必须回收进程
            let mut browser = browser;
            let _ = browser.close().await;
            let _ = browser.wait().await;
            handle.abort();
            return Err(BrowserError::PageCreationFailed { source: e }.into());
        }
    };

    debug!("浏览器启动成功");
    Ok((browser, page, handle))
}
