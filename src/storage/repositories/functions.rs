/*!
 * 命令定义源表
 *
 * `obex_dapl_functions` 由外部工具维护；这里负责联表读取源码与已持久化的字节码。
 */

use crate::storage::database::DatabaseManager;
use crate::storage::error::StorageResult;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// 联表查询得到的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub name: String,
    pub kind: Option<String>,
    pub interface: Option<String>,
    pub source_code: Option<String>,
    pub bytecode: Option<Vec<u8>>,
}

pub struct FunctionsRepository<'a> {
    db: &'a DatabaseManager,
}

impl<'a> FunctionsRepository<'a> {
    pub fn new(db: &'a DatabaseManager) -> Self {
        Self { db }
    }

    fn pool(&self) -> &sqlx::SqlitePool {
        self.db.pool()
    }

    /// 读取全部定义，左连接已持久化的字节码（没有时为 None）
    pub async fn fetch_with_bytecode(&self) -> StorageResult<Vec<FunctionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT f.name,
                   CAST(f.type AS BLOB) AS type,
                   CAST(f.interface AS BLOB) AS interface,
                   CAST(f.code AS BLOB) AS source_code,
                   b.bytecode
            FROM obex_dapl_functions f
            LEFT JOIN avap_bytecode b ON f.name = b.command_name
            ORDER BY f.rowid
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(FunctionRecord {
                name: row.try_get("name")?,
                kind: lossy_text(&row, "type")?,
                interface: lossy_text(&row, "interface")?,
                source_code: lossy_text(&row, "source_code")?,
                bytecode: row.try_get("bytecode")?,
            });
        }

        Ok(records)
    }

    /// 写入或覆盖一条源定义
    pub async fn upsert(
        &self,
        name: &str,
        kind: Option<&str>,
        interface: Option<&str>,
        source_code: Option<&str>,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO obex_dapl_functions (name, type, interface, code)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                type = excluded.type,
                interface = excluded.interface,
                code = excluded.code
            "#,
        )
        .bind(name)
        .bind(kind)
        .bind(interface)
        .bind(source_code)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> StorageResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM obex_dapl_functions")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

/// 外部工具可能写入 BLOB 或非 UTF-8 文本，按字节读取后有损转换
fn lossy_text(row: &SqliteRow, column: &str) -> StorageResult<Option<String>> {
    let bytes: Option<Vec<u8>> = row.try_get(column)?;
    Ok(bytes.map(|bytes| match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }))
}
