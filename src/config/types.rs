/*!
 * 配置类型定义
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// 服务配置
///
/// 进程启动时读取一次，之后在整个进程生命周期内不可变。
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 共享密钥，客户端通过 `x-avap-auth` 元数据携带
    pub api_key: String,
    /// 目录数据库连接串
    pub database_url: String,
    /// 是否在复用已持久化容器前校验签名
    pub strict_admission: bool,
}

impl ServerConfig {
    /// 监听地址字符串，形如 `0.0.0.0:50051`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// 密钥不进入日志
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("strict_admission", &self.strict_admission)
            .finish()
    }
}
