//! 共享密钥校验

use std::fmt;

use subtle::ConstantTimeEq;

use super::models::RequestMetadata;

/// 客户端携带凭据的元数据键
pub const AUTH_METADATA_KEY: &str = "x-avap-auth";

/// 授权守卫
///
/// 长度不同直接拒绝（长度可以通过时序泄露）；长度相同时按常量时间比较内容。
#[derive(Clone)]
pub struct AuthGuard {
    secret: Vec<u8>,
}

impl AuthGuard {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// 校验凭据字节
    pub fn is_authorized(&self, credential: Option<&[u8]>) -> bool {
        let Some(received) = credential else {
            return false;
        };
        if received.is_empty() || received.len() != self.secret.len() {
            return false;
        }
        received.ct_eq(&self.secret).into()
    }

    /// 从请求元数据中取出凭据再校验
    pub fn check(&self, metadata: &RequestMetadata) -> bool {
        self.is_authorized(metadata.get(AUTH_METADATA_KEY).map(|v| v.as_bytes()))
    }
}

impl fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGuard")
            .field("secret_len", &self.secret.len())
            .finish()
    }
}
