/*!
 * 内置表结构
 *
 * 两张表：
 * - `obex_dapl_functions`：命令定义源表（外部工具维护，本服务只读）
 * - `avap_bytecode`：打包结果的回写缓存，按命令名幂等 upsert
 */

/// 表结构脚本，按顺序执行；全部为幂等语句
#[derive(Debug, Clone, Copy)]
pub struct SchemaScript {
    pub name: &'static str,
    pub order: u32,
    pub statements: &'static [&'static str],
}

pub const SCHEMA_SCRIPTS: &[SchemaScript] = &[
    SchemaScript {
        name: "01_functions",
        order: 1,
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS obex_dapl_functions (
                name TEXT PRIMARY KEY NOT NULL,
                type TEXT,
                interface TEXT,
                code TEXT
            )
        "#],
    },
    SchemaScript {
        name: "02_bytecode",
        order: 2,
        statements: &[
            r#"
            CREATE TABLE IF NOT EXISTS avap_bytecode (
                command_name TEXT PRIMARY KEY NOT NULL,
                bytecode BLOB NOT NULL,
                source_hash TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_avap_bytecode_hash ON avap_bytecode(source_hash)",
        ],
    },
];
