//! AVAP Definitions 服务端
//!
//! 向语言工具分发已签名的 AVAP 命令定义。
//! 主要功能包括：
//! - 启动时从 SQLite 目录加载定义，缺失或无效的字节码重新打包并回写
//! - 共享密钥鉴权
//! - 按名称查询与全量同步

// 模块声明
pub mod config; // 服务配置
pub mod definitions; // 命令定义：容器、缓存、加载、请求处理
pub mod rpc; // 行分隔 JSON 传输层
pub mod setup; // 启动流程
pub mod storage; // SQLite 目录存储
pub mod utils; // 工具和错误处理模块

use config::ServerConfig;
use tracing::{error, info};
use utils::{init_logging, AppResult};

/// 等待 Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
}

/// 应用程序主入口点
pub async fn run() -> AppResult<()> {
    // 初始化日志系统
    if let Err(e) = init_logging() {
        eprintln!("日志系统初始化失败: {}", e);
        std::process::exit(1);
    }

    info!("AVAP Definitions 服务启动");

    let config = ServerConfig::from_env()?;
    let (state, server) = setup::bootstrap(config).await?;

    server.serve_until(shutdown_signal()).await?;

    if let Some(database) = state.database.as_ref() {
        database.close().await;
    }
    info!("AVAP Definitions 服务已停止");
    Ok(())
}
