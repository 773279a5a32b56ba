//! 已持久化容器的准入检查
//!
//! 加载时决定一个已存在的字节码能否直接复用，还是需要重新打包。

use super::container::{has_valid_prefix, ContainerPacker};

/// 准入检查
pub trait ContainerAdmission: Send + Sync {
    /// 返回 true 表示可以原样复用
    fn admit(&self, existing: Option<&[u8]>) -> bool;

    fn name(&self) -> &'static str;
}

/// 默认策略：只看 magic 前缀
///
/// 前缀正确但内容损坏或伪造的容器也会被复用。
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixAdmission;

impl ContainerAdmission for PrefixAdmission {
    fn admit(&self, existing: Option<&[u8]>) -> bool {
        has_valid_prefix(existing)
    }

    fn name(&self) -> &'static str {
        "prefix"
    }
}

/// 严格策略：结构和签名都必须正确
#[derive(Debug, Clone, Default)]
pub struct SignedAdmission {
    packer: ContainerPacker,
}

impl SignedAdmission {
    pub fn new(packer: ContainerPacker) -> Self {
        Self { packer }
    }
}

impl ContainerAdmission for SignedAdmission {
    fn admit(&self, existing: Option<&[u8]>) -> bool {
        existing.is_some_and(|bytes| self.packer.verify(bytes))
    }

    fn name(&self) -> &'static str {
        "signed"
    }
}
