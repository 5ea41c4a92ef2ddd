//! 日志初始化
//!
//! 日志统一写到 stderr，stdout 留给命令输出的 JSON。

use tracing_subscriber::EnvFilter;

/// 以默认级别（info）初始化日志
pub fn init() {
    init_with(false);
}

/// 初始化日志；`RUST_LOG` 优先于 `verbose`，重复调用无副作用
pub fn init_with(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
