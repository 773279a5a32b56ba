// 日志系统模块

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时使用的日志级别
const DEFAULT_LOG_LEVEL: &str = "info";

/// 初始化日志系统
/// 支持通过 RUST_LOG 环境变量控制日志级别，默认为 info
pub fn init_logging() -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| format!("日志系统初始化失败: {}", e))?;

    info!("日志系统初始化完成");
    Ok(())
}
