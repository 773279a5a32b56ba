/*!
 * 配置系统默认值
 */

use crate::config::types::ServerConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 50051;
pub const DEFAULT_API_KEY: &str = "avap_secret_key_2026";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://avap.db";

/// 创建默认服务配置
pub fn create_default_server_config() -> ServerConfig {
    ServerConfig {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
        api_key: DEFAULT_API_KEY.to_string(),
        database_url: DEFAULT_DATABASE_URL.to_string(),
        strict_admission: false,
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        create_default_server_config()
    }
}
