// 工具模块

pub mod error;

pub mod logging;

pub use error::{AppError, AppResult, Validator};
pub use logging::init_logging;
