/*!
 * 目录存储模块
 *
 * SQLite 目录库：命令定义源表 + 打包字节码回写表
 */

pub mod database;
pub mod error;
pub mod repositories;
pub mod schema;

pub use database::{DatabaseManager, DatabaseOptions, PoolSize};
pub use error::{StorageError, StorageResult};
pub use repositories::{BytecodeRecord, BytecodeRepository, FunctionRecord, FunctionsRepository};
