//! 应用程序初始化
//!
//! 启动顺序：校验配置 → 打开目录库 → 加载定义到缓存 → 绑定监听端口。
//! 目录库不可用时仍然对外服务（缓存为空），只有端口绑定失败才终止启动。

pub mod error;

pub use error::{SetupError, SetupResult};

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::definitions::{
    AuthGuard, CatalogLoader, CatalogStore, DefinitionCache, DefinitionService, LoadReport,
    SignedAdmission, SqliteCatalog,
};
use crate::rpc::RpcServer;
use crate::storage::{DatabaseManager, DatabaseOptions};

/// 运行期共享状态
pub struct AppState {
    pub config: ServerConfig,
    pub database: Option<Arc<DatabaseManager>>,
    pub cache: Arc<DefinitionCache>,
    pub service: Arc<DefinitionService>,
    pub load_report: Option<LoadReport>,
}

/// 打开目录库并应用表结构
pub async fn open_catalog_database(config: &ServerConfig) -> SetupResult<Arc<DatabaseManager>> {
    let database = DatabaseManager::new(&config.database_url, DatabaseOptions::default()).await?;
    database.initialize().await?;
    Ok(Arc::new(database))
}

/// 按配置选择准入策略
pub fn build_loader(
    config: &ServerConfig,
    store: Arc<dyn CatalogStore>,
    cache: Arc<DefinitionCache>,
) -> CatalogLoader {
    let loader = CatalogLoader::new(store, cache);
    if config.strict_admission {
        loader.with_admission(Arc::new(SignedAdmission::default()))
    } else {
        loader
    }
}

/// 初始化所有状态，目录相关的失败只记录日志
pub async fn initialize_app_state(config: ServerConfig) -> SetupResult<AppState> {
    config
        .validate()
        .map_err(|e| SetupError::Config(format!("{:#}", e)))?;

    let cache = Arc::new(DefinitionCache::new());

    let (database, load_report) = match open_catalog_database(&config).await {
        Ok(database) => {
            let store = Arc::new(SqliteCatalog::new(Arc::clone(&database)));
            let report = build_loader(&config, store, Arc::clone(&cache)).load().await;
            (Some(database), report)
        }
        Err(e) => {
            error!("目录数据库不可用，以空缓存启动: {}", e);
            (None, None)
        }
    };

    if cache.is_empty() {
        warn!("定义缓存为空，所有 GetCommand 请求将返回 NOT_FOUND");
    }

    let service = Arc::new(DefinitionService::new(
        Arc::clone(&cache),
        AuthGuard::new(config.api_key.clone()),
    ));

    Ok(AppState {
        config,
        database,
        cache,
        service,
        load_report,
    })
}

/// 完整启动流程：初始化状态并绑定端口
pub async fn bootstrap(config: ServerConfig) -> SetupResult<(AppState, RpcServer)> {
    let state = initialize_app_state(config).await?;
    let server = RpcServer::bind(&state.config.bind_address(), Arc::clone(&state.service)).await?;
    info!("AVAP Definition Server 初始化完成 ({:?})", state.config);
    Ok((state, server))
}
