//! 请求处理层
//!
//! 两个只读操作：按名称查询、全量同步。都先过授权守卫，再读缓存。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::auth::AuthGuard;
use super::cache::DefinitionCache;
use super::models::{
    CatalogSnapshot, CommandDefinition, DefinitionError, DefinitionResult, RequestMetadata,
};

/// 命令定义服务
#[derive(Debug, Clone)]
pub struct DefinitionService {
    cache: Arc<DefinitionCache>,
    guard: AuthGuard,
}

impl DefinitionService {
    pub fn new(cache: Arc<DefinitionCache>, guard: AuthGuard) -> Self {
        Self { cache, guard }
    }

    pub fn cache(&self) -> &Arc<DefinitionCache> {
        &self.cache
    }

    /// 查询单个命令定义
    pub fn get_command(
        &self,
        metadata: &RequestMetadata,
        name: &str,
    ) -> DefinitionResult<Arc<CommandDefinition>> {
        self.authorize(metadata, "GetCommand")?;

        self.cache.get(name).ok_or_else(|| {
            debug!("命令不存在: {}", name);
            DefinitionError::NotFound(name.to_string())
        })
    }

    /// 全量同步目录
    pub fn sync_catalog(&self, metadata: &RequestMetadata) -> DefinitionResult<CatalogSnapshot> {
        self.authorize(metadata, "SyncCatalog")?;

        let commands = self.cache.all();
        info!("SYNC: 向客户端发送 {} 条定义", commands.len());

        Ok(CatalogSnapshot {
            total_count: commands.len(),
            commands,
            freshness_marker: freshness_marker(),
        })
    }

    /// 授权检查，传输层在校验参数之前调用
    pub fn authorize(&self, metadata: &RequestMetadata, operation: &str) -> DefinitionResult<()> {
        if self.guard.check(metadata) {
            Ok(())
        } else {
            debug!("{} 鉴权失败", operation);
            Err(DefinitionError::Unauthenticated)
        }
    }
}

/// 响应时刻的标记，形如 `v-1767225600000`
///
/// 精度为毫秒，同一毫秒内的两次同步得到相同的标记，不能当作唯一版本号
fn freshness_marker() -> String {
    format!("v-{}", Utc::now().timestamp_millis())
}
