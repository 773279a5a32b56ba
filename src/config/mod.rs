/*!
 * 配置系统模块
 *
 * 从环境变量读取服务配置，未设置的项使用默认值。
 */

pub mod defaults;
pub mod types;

pub use defaults::create_default_server_config;
pub use types::ServerConfig;

use crate::utils::error::{AppResult, Validator};
use anyhow::{anyhow, Context};
use tracing::debug;

pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_STRICT_ADMISSION: &str = "AVAP_STRICT_ADMISSION";

impl ServerConfig {
    /// 从进程环境变量加载配置
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数加载配置，便于测试时注入
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = create_default_server_config();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }

        if let Some(port) = lookup(ENV_PORT) {
            config.port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("无效的端口配置 {}={}", ENV_PORT, port))?;
        }

        if let Some(api_key) = lookup(ENV_API_KEY) {
            config.api_key = api_key;
        }

        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.database_url = url;
        }

        if let Some(raw) = lookup(ENV_STRICT_ADMISSION) {
            config.strict_admission = parse_bool(&raw)
                .ok_or_else(|| anyhow!("无效的布尔配置 {}={}", ENV_STRICT_ADMISSION, raw))?;
        }

        config.validate()?;
        debug!("服务配置已加载: {:?}", config);
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        Validator::validate_not_empty(&self.host, "监听地址")?;
        Validator::validate_port(self.port)?;
        Validator::validate_not_empty(&self.api_key, "API_KEY")?;
        Validator::validate_not_empty(&self.database_url, "DATABASE_URL")?;
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
