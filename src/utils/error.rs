/*!
 * 错误处理模块
 *
 * 启动流程（配置、日志、数据库初始化）使用基于 anyhow 的统一结果类型，
 * 通过 context 提供错误信息。请求路径上的错误使用各模块自己的 thiserror 枚举。
 */

use anyhow::{anyhow, Result as AnyhowResult};

/// 统一的应用程序结果类型
pub type AppResult<T> = AnyhowResult<T>;

/// 统一的应用程序错误类型
pub type AppError = anyhow::Error;

/// 创建简单的应用程序错误
pub fn app_error(msg: impl Into<String>) -> AppError {
    anyhow!(msg.into())
}

// ============================================================================
// 参数验证工具
// ============================================================================

/// 参数验证器
pub struct Validator;

impl Validator {
    /// 验证字符串不为空
    pub fn validate_not_empty(value: &str, name: &str) -> AppResult<()> {
        if value.trim().is_empty() {
            Err(app_error(format!("{}不能为空", name)))
        } else {
            Ok(())
        }
    }

    /// 验证端口号有效（非 0）
    pub fn validate_port(port: u16) -> AppResult<()> {
        if port == 0 {
            Err(app_error("端口号不能为 0"))
        } else {
            Ok(())
        }
    }
}
