/*!
 * 目录加载链路集成测试
 *
 * SQLite 目录 → 加载器 → 缓存 → 请求处理，覆盖端到端场景
 */
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use definitions_lib::definitions::{
    AuthGuard, CatalogError, CatalogLoader, CatalogResult, CatalogRow, CatalogStore,
    ContainerHeader, ContainerPacker, DefinitionCache, DefinitionError, DefinitionService,
    RequestMetadata, SqliteCatalog, AUTH_METADATA_KEY,
};
use definitions_lib::storage::{BytecodeRepository, DatabaseManager, FunctionsRepository};

const SECRET: &str = "avap_secret_key_2026";

/// 已初始化表结构的内存目录库
async fn create_test_database() -> Arc<DatabaseManager> {
    let database = DatabaseManager::in_memory()
        .await
        .expect("创建内存数据库失败");
    database.initialize().await.expect("初始化数据库失败");
    Arc::new(database)
}

type SeedRow<'a> = (&'a str, Option<&'a str>, Option<&'a str>, Option<&'a str>);

async fn seed(database: &DatabaseManager, rows: &[SeedRow<'_>]) {
    let repo = FunctionsRepository::new(database);
    for (name, kind, interface, code) in rows {
        repo.upsert(name, *kind, *interface, *code)
            .await
            .expect("写入目录失败");
    }
}

fn service_for(cache: Arc<DefinitionCache>) -> DefinitionService {
    DefinitionService::new(cache, AuthGuard::new(SECRET))
}

fn authorized() -> RequestMetadata {
    let mut metadata = HashMap::new();
    metadata.insert(AUTH_METADATA_KEY.to_string(), SECRET.to_string());
    metadata
}

async fn load_from(database: Arc<DatabaseManager>) -> Arc<DefinitionCache> {
    let cache = Arc::new(DefinitionCache::new());
    let store = Arc::new(SqliteCatalog::new(database));
    CatalogLoader::new(store, Arc::clone(&cache)).load().await;
    cache
}

/// 所有操作都失败的目录
struct UnreachableCatalog;

#[async_trait]
impl CatalogStore for UnreachableCatalog {
    async fn fetch_all(&self) -> CatalogResult<Vec<CatalogRow>> {
        Err(CatalogError::Unavailable("connection refused".to_string()))
    }

    async fn upsert_container(&self, _: &str, _: &[u8], _: &str) -> CatalogResult<()> {
        Err(CatalogError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_load_then_get_command() {
    let database = create_test_database().await;
    seed(&database, &[("if", None, None, Some("print(1)"))]).await;

    let service = service_for(load_from(Arc::clone(&database)).await);
    let definition = service.get_command(&authorized(), "if").unwrap();

    assert_eq!(definition.name, "if");
    assert_eq!(definition.kind, "function");
    assert_eq!(definition.interface_descriptor, "[]");
    assert_eq!(definition.revision_tag, "v-enterprise");

    let header = ContainerHeader::parse(&definition.container).unwrap();
    assert_eq!(header.payload_str(), Some("print(1)"));
    assert!(ContainerPacker::default().verify(&definition.container));

    // 打包结果已回写
    let persisted = BytecodeRepository::new(&database)
        .find("if")
        .await
        .unwrap()
        .expect("字节码应已回写");
    assert_eq!(persisted.bytecode, definition.container);
}

#[tokio::test]
async fn test_missing_credential_is_unauthenticated() {
    let database = create_test_database().await;
    seed(&database, &[("if", None, None, Some("print(1)"))]).await;
    let service = service_for(load_from(database).await);

    assert_eq!(
        service.get_command(&RequestMetadata::new(), "if"),
        Err(DefinitionError::Unauthenticated)
    );
}

#[tokio::test]
async fn test_unknown_name_is_not_found() {
    let database = create_test_database().await;
    seed(&database, &[("if", None, None, Some("print(1)"))]).await;
    let service = service_for(load_from(database).await);

    assert_eq!(
        service.get_command(&authorized(), "unknown"),
        Err(DefinitionError::NotFound("unknown".to_string()))
    );
}

#[tokio::test]
async fn test_sync_catalog_returns_every_entry() {
    let database = create_test_database().await;
    seed(
        &database,
        &[
            ("if", Some("statement"), Some("[\"cond\"]"), Some("print(1)")),
            ("else", Some("statement"), None, Some("print(2)")),
            ("addVar", None, Some("[\"name\",\"value\"]"), None),
        ],
    )
    .await;
    let service = service_for(load_from(database).await);

    let snapshot = service.sync_catalog(&authorized()).unwrap();
    assert_eq!(snapshot.total_count, 3);
    assert_eq!(snapshot.commands.len(), 3);

    let mut names: Vec<_> = snapshot.commands.iter().map(|d| d.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["addVar", "else", "if"]);

    let add_var = snapshot
        .commands
        .iter()
        .find(|d| d.name == "addVar")
        .unwrap();
    assert_eq!(add_var.kind, "function");
    assert_eq!(add_var.interface_descriptor, "[\"name\",\"value\"]");
    assert_eq!(add_var.container.len(), 42);
}

#[tokio::test]
async fn test_missing_tables_leave_cache_empty() {
    let database = DatabaseManager::in_memory().await.unwrap();
    let service = service_for(load_from(Arc::new(database)).await);

    assert_eq!(
        service.get_command(&authorized(), "if"),
        Err(DefinitionError::NotFound("if".to_string()))
    );
    assert_eq!(service.sync_catalog(&authorized()).unwrap().total_count, 0);
}

#[tokio::test]
async fn test_unreachable_catalog_leaves_cache_empty() {
    let cache = Arc::new(DefinitionCache::new());
    let loader = CatalogLoader::new(Arc::new(UnreachableCatalog), Arc::clone(&cache));

    assert!(loader.load().await.is_none());
    assert!(cache.is_empty());
    assert_eq!(
        service_for(cache).get_command(&authorized(), "if"),
        Err(DefinitionError::NotFound("if".to_string()))
    );
}

#[tokio::test]
async fn test_reload_does_not_rewrite_valid_containers() {
    let database = create_test_database().await;
    seed(
        &database,
        &[
            ("if", None, None, Some("print(1)")),
            ("else", None, None, Some("print(2)")),
        ],
    )
    .await;

    let store = Arc::new(SqliteCatalog::new(Arc::clone(&database)));
    let cache = Arc::new(DefinitionCache::new());
    let loader = CatalogLoader::new(store, Arc::clone(&cache));

    let first = loader.load().await.unwrap();
    assert_eq!(first.repacked, 2);
    let before = BytecodeRepository::new(&database).find("if").await.unwrap();

    let second = loader.load().await.unwrap();
    assert_eq!(second.reused, 2);
    assert_eq!(second.repacked, 0);
    let after = BytecodeRepository::new(&database).find("if").await.unwrap();

    assert_eq!(before, after);
    assert_eq!(cache.size(), 2);
}

#[tokio::test]
async fn test_foreign_bytecode_is_replaced() {
    let database = create_test_database().await;
    seed(&database, &[("if", None, None, Some("print(1)"))]).await;
    BytecodeRepository::new(&database)
        .upsert("if", b"#!legacy", "")
        .await
        .unwrap();

    let cache = load_from(Arc::clone(&database)).await;

    let expected = ContainerPacker::default().pack("print(1)");
    assert_eq!(cache.get("if").unwrap().container, expected);
    let persisted = BytecodeRepository::new(&database)
        .find("if")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(persisted.bytecode, expected);
}

#[tokio::test]
async fn test_cache_is_complete_and_sized() {
    let database = create_test_database().await;
    let sources: Vec<(String, String)> = (0..20)
        .map(|i| (format!("cmd_{i}"), "x".repeat(i)))
        .collect();
    let repo = FunctionsRepository::new(&database);
    for (name, code) in &sources {
        repo.upsert(name, None, None, Some(code.as_str())).await.unwrap();
    }

    let cache = load_from(database).await;
    assert_eq!(cache.size(), sources.len());
    for (name, code) in &sources {
        let definition = cache.get(name).expect("每条目录记录都应进入缓存");
        assert_eq!(definition.container.len(), 42 + code.len());
        let header = ContainerHeader::parse(&definition.container).unwrap();
        assert_eq!(header.payload_len as usize, code.len());
    }
}

#[tokio::test]
async fn test_undecodable_code_does_not_abort_load() {
    let database = create_test_database().await;
    seed(&database, &[("if", None, None, Some("print(1)"))]).await;
    // 外部工具写入的 BLOB 与非 UTF-8 字节
    sqlx::query(
        "INSERT INTO obex_dapl_functions (name, code) VALUES ('bad', X'FF'), ('blob', X'783D31')",
    )
    .execute(database.pool())
    .await
    .unwrap();

    let cache = load_from(database).await;
    assert_eq!(cache.size(), 3);

    let payload_of = |name: &str| {
        let definition = cache.get(name).expect("记录应进入缓存");
        ContainerHeader::parse(&definition.container)
            .unwrap()
            .payload_str()
            .map(str::to_string)
    };
    assert_eq!(payload_of("if").as_deref(), Some("print(1)"));
    assert_eq!(payload_of("blob").as_deref(), Some("x=1"));
    assert_eq!(payload_of("bad").as_deref(), Some("\u{FFFD}"));
}
