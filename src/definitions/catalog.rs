//! 目录存储接口
//!
//! 加载器只依赖 [`CatalogStore`]；生产环境使用 SQLite 实现。

use std::sync::Arc;

use async_trait::async_trait;

use super::models::CatalogRow;
use crate::storage::error::StorageError;
use crate::storage::{BytecodeRepository, DatabaseManager, FunctionRecord, FunctionsRepository};

/// 目录存储错误（连接失败、查询失败）
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("目录存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("目录不可用: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// 目录存储
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// 读取全部定义及已持久化的容器
    async fn fetch_all(&self) -> CatalogResult<Vec<CatalogRow>>;

    /// 按命令名幂等写入打包结果
    async fn upsert_container(
        &self,
        name: &str,
        container: &[u8],
        source_hash: &str,
    ) -> CatalogResult<()>;
}

impl From<FunctionRecord> for CatalogRow {
    fn from(record: FunctionRecord) -> Self {
        Self {
            name: record.name,
            kind: record.kind,
            interface_descriptor: record.interface,
            source_text: record.source_code,
            existing_container: record.bytecode,
        }
    }
}

/// 基于 SQLite 的目录存储
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    db: Arc<DatabaseManager>,
}

impl SqliteCatalog {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn fetch_all(&self) -> CatalogResult<Vec<CatalogRow>> {
        let records = FunctionsRepository::new(&self.db)
            .fetch_with_bytecode()
            .await?;
        Ok(records.into_iter().map(CatalogRow::from).collect())
    }

    async fn upsert_container(
        &self,
        name: &str,
        container: &[u8],
        source_hash: &str,
    ) -> CatalogResult<()> {
        BytecodeRepository::new(&self.db)
            .upsert(name, container, source_hash)
            .await?;
        Ok(())
    }
}
