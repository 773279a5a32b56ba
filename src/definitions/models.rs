//! 命令定义数据模型

use std::collections::HashMap;
use std::sync::Arc;

/// 目录中缺少 type 时的默认分类
pub const DEFAULT_KIND: &str = "function";

/// 目录中缺少 interface 时的默认接口描述（空列表）
pub const DEFAULT_INTERFACE: &str = "[]";

/// 同一次加载产生的所有定义共享的版本标记，不随内容变化
pub const REVISION_TAG: &str = "v-enterprise";

/// 请求元数据（键值对），凭据放在 `x-avap-auth` 中
pub type RequestMetadata = HashMap<String, String>;

/// 请求处理错误
///
/// 两者都是按请求处理的预期结果，不会影响其他请求。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("Invalid Credentials")]
    Unauthenticated,

    #[error("Command '{0}' not found")]
    NotFound(String),
}

pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// 下发给客户端的命令定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    pub name: String,
    pub kind: String,
    pub interface_descriptor: String,
    /// 已签名的二进制容器
    pub container: Vec<u8>,
    pub revision_tag: String,
}

impl CommandDefinition {
    /// 从目录行构造，补齐缺省字段
    pub fn from_row(row: &CatalogRow, container: Vec<u8>, revision_tag: &str) -> Self {
        Self {
            name: row.name.clone(),
            kind: row
                .kind
                .clone()
                .unwrap_or_else(|| DEFAULT_KIND.to_string()),
            interface_descriptor: row
                .interface_descriptor
                .clone()
                .unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
            container,
            revision_tag: revision_tag.to_string(),
        }
    }
}

/// 目录中的一行：源定义 + 可能已持久化的容器
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    pub name: String,
    pub kind: Option<String>,
    pub interface_descriptor: Option<String>,
    pub source_text: Option<String>,
    pub existing_container: Option<Vec<u8>>,
}

impl CatalogRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_text = Some(source.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface_descriptor = Some(interface.into());
        self
    }

    pub fn with_container(mut self, container: Vec<u8>) -> Self {
        self.existing_container = Some(container);
        self
    }

    /// 源码缺失时按空文本处理
    pub fn source_or_empty(&self) -> &str {
        self.source_text.as_deref().unwrap_or("")
    }
}

/// 全量同步结果
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub commands: Vec<Arc<CommandDefinition>>,
    pub total_count: usize,
    /// 响应时刻生成的标记，每次调用都会变化，不代表内容变化
    pub freshness_marker: String,
}

/// 一次成功加载的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// 扫描到的目录行数
    pub total: usize,
    /// 直接复用已持久化容器的行数
    pub reused: usize,
    /// 重新打包并回写的行数
    pub repacked: usize,
    /// 加载完成后的缓存条目数
    pub cache_size: usize,
}
