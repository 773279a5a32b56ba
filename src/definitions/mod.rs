//! 命令定义模块
//!
//! 提供 AVAP 命令定义的完整读取链路：
//! - 启动时从目录加载定义，缺失或无效的字节码重新打包并回写
//! - 签名容器格式（magic + 版本 + 长度 + HMAC 签名 + 源码）
//! - 共享密钥的常量时间校验
//! - 按名称查询与全量同步

pub mod admission;
pub mod auth;
mod cache;
pub mod catalog;
pub mod container;
mod loader;
mod models;
mod service;

pub use admission::{ContainerAdmission, PrefixAdmission, SignedAdmission};
pub use auth::{AuthGuard, AUTH_METADATA_KEY};
pub use cache::{CacheBuilder, CacheStats, DefinitionCache};
pub use catalog::{CatalogError, CatalogResult, CatalogStore, SqliteCatalog};
pub use container::{ContainerError, ContainerHeader, ContainerPacker};
pub use loader::CatalogLoader;
pub use models::{
    CatalogRow, CatalogSnapshot, CommandDefinition, DefinitionError, DefinitionResult,
    LoadReport, RequestMetadata, DEFAULT_INTERFACE, DEFAULT_KIND, REVISION_TAG,
};
pub use service::DefinitionService;
