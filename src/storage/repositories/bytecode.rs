/*!
 * 字节码回写缓存
 *
 * 跨进程重启保存打包结果，避免重复打包
 */

use crate::storage::database::DatabaseManager;
use crate::storage::error::StorageResult;
use sqlx::Row;

/// 已持久化的打包结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeRecord {
    pub command_name: String,
    pub bytecode: Vec<u8>,
    pub source_hash: String,
}

pub struct BytecodeRepository<'a> {
    db: &'a DatabaseManager,
}

impl<'a> BytecodeRepository<'a> {
    pub fn new(db: &'a DatabaseManager) -> Self {
        Self { db }
    }

    fn pool(&self) -> &sqlx::SqlitePool {
        self.db.pool()
    }

    /// 按命令名幂等写入：不存在则插入，存在则覆盖
    pub async fn upsert(
        &self,
        command_name: &str,
        bytecode: &[u8],
        source_hash: &str,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO avap_bytecode (command_name, bytecode, source_hash, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(command_name) DO UPDATE SET
                bytecode = excluded.bytecode,
                source_hash = excluded.source_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(command_name)
        .bind(bytecode)
        .bind(source_hash)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn find(&self, command_name: &str) -> StorageResult<Option<BytecodeRecord>> {
        let row = sqlx::query(
            "SELECT command_name, bytecode, source_hash FROM avap_bytecode WHERE command_name = ? LIMIT 1",
        )
        .bind(command_name)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(BytecodeRecord {
                command_name: r.try_get("command_name")?,
                bytecode: r.try_get("bytecode")?,
                source_hash: r.try_get("source_hash")?,
            })),
            None => Ok(None),
        }
    }
}
