/*!
 * RPC 服务端集成测试
 *
 * 从磁盘目录库启动完整服务，通过 TCP 客户端发起请求
 */
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use definitions_lib::config::{create_default_server_config, ServerConfig};
use definitions_lib::definitions::ContainerPacker;
use definitions_lib::rpc::{
    CatalogPayload, CommandPayload, RpcResponse, RpcResult, RpcServer, StatusCode,
};
use definitions_lib::setup::initialize_app_state;
use definitions_lib::storage::{DatabaseManager, DatabaseOptions, FunctionsRepository};

const SECRET: &str = "integration-secret";

struct TestServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<RpcResult<()>>,
    _dir: TempDir,
}

struct Client {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("连接服务端失败");
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn call(&mut self, request: Value) -> RpcResponse {
        let mut line = request.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
        let reply = self
            .reader
            .next_line()
            .await
            .unwrap()
            .expect("服务端提前关闭连接");
        serde_json::from_str(&reply).unwrap()
    }
}

/// 预置目录库并启动服务
async fn start_server(rows: &[(&str, &str)]) -> TestServer {
    let dir = TempDir::new().expect("创建临时目录失败");
    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());

    let seed_db = DatabaseManager::new(&url, DatabaseOptions::default())
        .await
        .unwrap();
    seed_db.initialize().await.unwrap();
    let repo = FunctionsRepository::new(&seed_db);
    for (name, code) in rows {
        repo.upsert(name, None, None, Some(*code)).await.unwrap();
    }
    seed_db.close().await;

    let config = ServerConfig {
        api_key: SECRET.to_string(),
        database_url: url,
        ..create_default_server_config()
    };
    let state = initialize_app_state(config).await.unwrap();
    assert_eq!(state.cache.size(), rows.len());

    let server = RpcServer::bind("127.0.0.1:0", Arc::clone(&state.service))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_until(async {
        let _ = rx.await;
    }));

    TestServer {
        addr,
        shutdown,
        handle,
        _dir: dir,
    }
}

impl TestServer {
    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_get_command_over_tcp() {
    let server = start_server(&[("if", "print(1)")]).await;
    let mut client = Client::connect(server.addr).await;

    let response = client
        .call(json!({
            "id": 1,
            "method": "GetCommand",
            "metadata": {"x-avap-auth": SECRET},
            "params": {"name": "if"}
        }))
        .await;

    assert!(response.status_is(StatusCode::Ok));
    let payload: CommandPayload = serde_json::from_value(response.data.unwrap()).unwrap();
    assert_eq!(payload.name, "if");
    assert_eq!(payload.kind, "function");
    assert_eq!(payload.revision_tag, "v-enterprise");
    assert_eq!(
        payload.container_bytes().unwrap(),
        ContainerPacker::default().pack("print(1)")
    );

    server.stop().await;
}

#[tokio::test]
async fn test_error_codes_over_tcp() {
    let server = start_server(&[("if", "print(1)")]).await;
    let mut client = Client::connect(server.addr).await;

    let wrong_key = client
        .call(json!({
            "method": "GetCommand",
            "metadata": {"x-avap-auth": "WRONG_TOKEN"},
            "params": {"name": "if"}
        }))
        .await;
    assert_eq!(wrong_key.code, 16);

    let unknown = client
        .call(json!({
            "method": "GetCommand",
            "metadata": {"x-avap-auth": SECRET},
            "params": {"name": "unknown"}
        }))
        .await;
    assert_eq!(unknown.code, 5);

    let unimplemented = client.call(json!({"method": "Reload"})).await;
    assert_eq!(unimplemented.code, 12);

    server.stop().await;
}

#[tokio::test]
async fn test_sync_catalog_over_tcp() {
    let server = start_server(&[("a", "1"), ("b", "2"), ("c", "3")]).await;
    let mut client = Client::connect(server.addr).await;

    let response = client
        .call(json!({"method": "SyncCatalog", "metadata": {"x-avap-auth": SECRET}}))
        .await;

    let payload: CatalogPayload = serde_json::from_value(response.data.unwrap()).unwrap();
    assert_eq!(payload.total_count, 3);
    assert_eq!(payload.commands.len(), 3);
    assert!(payload.freshness_marker.starts_with("v-"));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients() {
    let server = start_server(&[("if", "print(1)"), ("else", "print(2)")]).await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(addr).await;
            let name = if i % 2 == 0 { "if" } else { "else" };
            let response = client
                .call(json!({
                    "id": i,
                    "method": "GetCommand",
                    "metadata": {"x-avap-auth": SECRET},
                    "params": {"name": name}
                }))
                .await;
            assert_eq!(response.id, Some(i));
            assert!(response.status_is(StatusCode::Ok));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    server.stop().await;
}

#[tokio::test]
async fn test_health_without_catalog() {
    let server = start_server(&[]).await;
    let mut client = Client::connect(server.addr).await;

    let response = client.call(json!({"method": "Health"})).await;
    assert!(response.status_is(StatusCode::Ok));
    assert_eq!(response.data.unwrap()["status"], "SERVING");

    server.stop().await;
}
