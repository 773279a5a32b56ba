//! 签名容器格式
//!
//! 布局（多字节整数均为大端序）：
//!
//! ```text
//! 0   magic           4 字节 "AVAP"
//! 4   version         2 字节
//! 6   payload length  4 字节
//! 10  signature       32 字节 HMAC-SHA256(header || payload)
//! 42  payload         UTF-8 源码
//! ```

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const MAGIC: &[u8; 4] = b"AVAP";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 10;
pub const SIGNATURE_LEN: usize = 32;
pub const PAYLOAD_OFFSET: usize = HEADER_LEN + SIGNATURE_LEN;

/// 进程内置的签名密钥
const EMBEDDED_SIGNING_KEY: &[u8] = b"avap_secure_signature_key_2026";

/// 容器解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("容器过短: {len} 字节")]
    TooShort { len: usize },

    #[error("容器 magic 不匹配")]
    BadMagic,

    #[error("不支持的容器版本: {0}")]
    UnsupportedVersion(u16),

    #[error("payload 长度不一致: 声明 {declared}，实际 {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

/// 读取回来的容器头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader<'a> {
    pub version: u16,
    pub payload_len: u32,
    pub signature: &'a [u8],
    pub payload: &'a [u8],
}

impl<'a> ContainerHeader<'a> {
    /// 解析完整容器，检查 magic、版本和长度字段（不校验签名）
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ContainerError> {
        if bytes.len() < PAYLOAD_OFFSET {
            return Err(ContainerError::TooShort { len: bytes.len() });
        }
        if &bytes[..4] != MAGIC {
            return Err(ContainerError::BadMagic);
        }

        let version = u16::from_be_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion(version));
        }

        let payload_len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload = &bytes[PAYLOAD_OFFSET..];
        if payload.len() != payload_len as usize {
            return Err(ContainerError::LengthMismatch {
                declared: payload_len as usize,
                actual: payload.len(),
            });
        }

        Ok(Self {
            version,
            payload_len,
            signature: &bytes[HEADER_LEN..PAYLOAD_OFFSET],
            payload,
        })
    }

    /// payload 按 UTF-8 解读
    pub fn payload_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.payload).ok()
    }
}

/// 只看前 4 字节是否为 magic；不检查长度、版本和签名
pub fn has_valid_prefix(blob: Option<&[u8]>) -> bool {
    match blob {
        Some(bytes) => bytes.len() >= MAGIC.len() && &bytes[..MAGIC.len()] == MAGIC,
        None => false,
    }
}

/// 源码 SHA-256 十六进制摘要，回写目录时作为记账信息
pub fn source_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

/// 字节码打包器
#[derive(Clone)]
pub struct ContainerPacker {
    key: Vec<u8>,
}

impl ContainerPacker {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// 把源码打包成签名容器，相同输入总是得到相同输出
    pub fn pack(&self, source: &str) -> Vec<u8> {
        let payload = source.as_bytes();

        let mut header = [0u8; HEADER_LEN];
        header[..4].copy_from_slice(MAGIC);
        header[4..6].copy_from_slice(&FORMAT_VERSION.to_be_bytes());
        header[6..10].copy_from_slice(&(payload.len() as u32).to_be_bytes());

        let signature = self.sign(&header, payload);

        let mut container = Vec::with_capacity(PAYLOAD_OFFSET + payload.len());
        container.extend_from_slice(&header);
        container.extend_from_slice(&signature);
        container.extend_from_slice(payload);
        container
    }

    /// 完整校验：结构合法且签名匹配
    pub fn verify(&self, container: &[u8]) -> bool {
        let Ok(parsed) = ContainerHeader::parse(container) else {
            return false;
        };
        let expected = self.sign(&container[..HEADER_LEN], parsed.payload);
        parsed.signature.ct_eq(&expected[..]).into()
    }

    fn sign(&self, header: &[u8], payload: &[u8]) -> [u8; SIGNATURE_LEN] {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(header);
        mac.update(payload);

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&mac.finalize().into_bytes());
        signature
    }
}

impl Default for ContainerPacker {
    fn default() -> Self {
        Self::new(EMBEDDED_SIGNING_KEY)
    }
}

impl std::fmt::Debug for ContainerPacker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerPacker").finish_non_exhaustive()
    }
}
