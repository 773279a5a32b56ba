//! 目录加载流程
//!
//! 启动时执行一次：读取目录，复用合格的容器，其余重新打包并回写，最后整体发布到缓存。

use std::sync::Arc;

use tracing::{debug, error, info};

use super::admission::{ContainerAdmission, PrefixAdmission};
use super::cache::{CacheBuilder, DefinitionCache};
use super::catalog::{CatalogResult, CatalogStore};
use super::container::{source_hash, ContainerPacker};
use super::models::{CommandDefinition, LoadReport, REVISION_TAG};

/// 目录加载器
pub struct CatalogLoader {
    store: Arc<dyn CatalogStore>,
    cache: Arc<DefinitionCache>,
    packer: ContainerPacker,
    admission: Arc<dyn ContainerAdmission>,
}

impl CatalogLoader {
    pub fn new(store: Arc<dyn CatalogStore>, cache: Arc<DefinitionCache>) -> Self {
        Self {
            store,
            cache,
            packer: ContainerPacker::default(),
            admission: Arc::new(PrefixAdmission),
        }
    }

    pub fn with_admission(mut self, admission: Arc<dyn ContainerAdmission>) -> Self {
        self.admission = admission;
        self
    }

    pub fn cache(&self) -> &Arc<DefinitionCache> {
        &self.cache
    }

    /// 执行一次加载；目录错误只记录日志，缓存保持调用前的状态
    pub async fn load(&self) -> Option<LoadReport> {
        info!("[AVAP_Definitions] 初始化构建流程 (准入策略: {})", self.admission.name());

        match self.try_load().await {
            Ok(report) => {
                let stats = self.cache.stats();
                info!(
                    "[AVAP_Definitions] {} 条定义已就绪 (复用 {}, 重新打包 {}, 容器共 {} 字节)",
                    report.cache_size, report.reused, report.repacked, stats.container_bytes
                );
                Some(report)
            }
            Err(e) => {
                error!(
                    "[AVAP_Definitions] 构建流程失败，保留现有缓存 ({} 条): {}",
                    self.cache.size(),
                    e
                );
                None
            }
        }
    }

    /// 执行一次加载并返回错误，成功时才替换缓存
    pub async fn try_load(&self) -> CatalogResult<LoadReport> {
        let rows = self.store.fetch_all().await?;

        let mut builder = CacheBuilder::new();
        let mut report = LoadReport {
            total: rows.len(),
            ..LoadReport::default()
        };

        for row in &rows {
            let container = match &row.existing_container {
                Some(existing) if self.admission.admit(Some(existing)) => {
                    report.reused += 1;
                    existing.clone()
                }
                _ => {
                    debug!("[BUILD] 打包: {}", row.name);
                    let source = row.source_or_empty();
                    let packed = self.packer.pack(source);
                    self.store
                        .upsert_container(&row.name, &packed, &source_hash(source))
                        .await?;
                    report.repacked += 1;
                    packed
                }
            };

            builder.insert(CommandDefinition::from_row(row, container, REVISION_TAG));
        }

        report.cache_size = self.cache.publish(builder);
        Ok(report)
    }
}
