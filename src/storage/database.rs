use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::SCHEMA_SCRIPTS;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{ConnectOptions, Executor};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone)]
pub enum PoolSize {
    Fixed(NonZeroU32),
    Adaptive { min: NonZeroU32, max: NonZeroU32 },
}

impl PoolSize {
    fn resolve(&self) -> (u32, u32) {
        match self {
            PoolSize::Fixed(size) => (size.get(), size.get()),
            PoolSize::Adaptive { min, max } => {
                let cpu = std::thread::available_parallelism()
                    .map(|n| n.get() as u32)
                    .unwrap_or(4);
                let suggested = (cpu * 2).clamp(min.get(), max.get());
                (min.get(), suggested)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub pool_size: PoolSize,
    pub connection_timeout: Duration,
    pub statement_timeout: Duration,
    pub wal: bool,
    /// 为 None 时连接永不因空闲被回收
    pub idle_timeout: Option<Duration>,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            pool_size: PoolSize::Adaptive {
                min: NonZeroU32::MIN,
                max: NonZeroU32::new(16).unwrap_or(NonZeroU32::MIN),
            },
            connection_timeout: Duration::from_secs(10),
            statement_timeout: Duration::from_secs(30),
            wal: true,
            idle_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl DatabaseOptions {
    /// 内存数据库只能有一个连接，且连接不能被回收，否则数据随连接一起消失
    pub fn in_memory() -> Self {
        Self {
            pool_size: PoolSize::Fixed(NonZeroU32::MIN),
            wal: false,
            idle_timeout: None,
            ..Self::default()
        }
    }
}

/// 目录数据库管理器
pub struct DatabaseManager {
    pool: SqlitePool,
    url: String,
    options: DatabaseOptions,
}

impl fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseManager")
            .field("url", &self.url)
            .field("options", &self.options)
            .finish()
    }
}

impl DatabaseManager {
    pub async fn new(url: &str, options: DatabaseOptions) -> StorageResult<Self> {
        if !url.starts_with("sqlite:") {
            return Err(StorageError::InvalidUrl(url.to_string()));
        }

        let (min_conn, max_conn) = options.pool_size.resolve();

        let connect_options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", url, e)))?
            .create_if_missing(true)
            .journal_mode(if options.wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Memory
            })
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(options.statement_timeout)
            .disable_statement_logging();

        let mut pool_options = SqlitePoolOptions::new()
            .min_connections(min_conn)
            .max_connections(max_conn)
            .acquire_timeout(options.connection_timeout)
            .idle_timeout(options.idle_timeout);
        if options.idle_timeout.is_none() {
            pool_options = pool_options.max_lifetime(None);
        }

        let pool = pool_options.connect_with(connect_options).await?;

        debug!("数据库连接池已创建: {} (连接数 {}..={})", url, min_conn, max_conn);

        Ok(Self {
            pool,
            url: url.to_string(),
            options,
        })
    }

    /// 创建内存数据库，主要用于测试
    pub async fn in_memory() -> StorageResult<Self> {
        Self::new(IN_MEMORY_URL, DatabaseOptions::in_memory()).await
    }

    /// 应用内置表结构
    pub async fn initialize(&self) -> StorageResult<()> {
        let mut scripts = SCHEMA_SCRIPTS.to_vec();
        scripts.sort_by_key(|s| s.order);

        for script in scripts {
            debug!("执行SQL脚本: {}", script.name);
            for statement in script.statements {
                if statement.trim().is_empty() {
                    continue;
                }
                self.pool.execute(*statement).await?;
            }
        }

        info!("目录数据库初始化完成: {}", self.url);
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
