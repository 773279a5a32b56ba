/*!
 * RPC 协议定义
 *
 * 每行一个 JSON 请求，每行一个 JSON 响应。状态码沿用 gRPC 的编号，
 * 客户端可以直接按 UNAUTHENTICATED / NOT_FOUND 区分处理。
 */

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::definitions::{
    CatalogSnapshot, CommandDefinition, DefinitionError, DefinitionService, RequestMetadata,
};

pub const METHOD_GET_COMMAND: &str = "GetCommand";
pub const METHOD_SYNC_CATALOG: &str = "SyncCatalog";
pub const METHOD_HEALTH: &str = "Health";

/// 服务名，健康检查时使用
pub const SERVICE_NAME: &str = "avap.DefinitionEngine";

/// 响应状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    InvalidArgument,
    NotFound,
    Unimplemented,
    Internal,
    Unauthenticated,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::InvalidArgument => 3,
            StatusCode::NotFound => 5,
            StatusCode::Unimplemented => 12,
            StatusCode::Internal => 13,
            StatusCode::Unauthenticated => 16,
        }
    }
}

impl From<&DefinitionError> for StatusCode {
    fn from(error: &DefinitionError) -> Self {
        match error {
            DefinitionError::Unauthenticated => StatusCode::Unauthenticated,
            DefinitionError::NotFound(_) => StatusCode::NotFound,
        }
    }
}

/// 请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Option<u64>,
    pub method: String,
    #[serde(default, deserialize_with = "string_entries")]
    pub metadata: RequestMetadata,
    #[serde(default)]
    pub params: Value,
}

/// 元数据只保留字符串值，其余类型的条目直接忽略
fn string_entries<'de, D>(deserializer: D) -> Result<RequestMetadata, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            _ => None,
        })
        .collect())
}

/// 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: Option<u64>,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    /// 成功响应
    pub fn ok<T: Serialize>(id: Option<u64>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                id,
                code: StatusCode::Ok.as_u16(),
                message: None,
                data: Some(value),
            },
            Err(e) => {
                warn!("响应序列化失败: {}", e);
                Self::error(id, StatusCode::Internal, "response encoding failed")
            }
        }
    }

    /// 错误响应
    pub fn error(id: Option<u64>, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            id,
            code: status.as_u16(),
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn from_definition_error(id: Option<u64>, error: &DefinitionError) -> Self {
        Self::error(id, StatusCode::from(error), error.to_string())
    }

    pub fn status_is(&self, status: StatusCode) -> bool {
        self.code == status.as_u16()
    }
}

/// 单个命令定义，容器以 base64 传输
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPayload {
    pub name: String,
    pub kind: String,
    pub interface_descriptor: String,
    pub container: String,
    pub revision_tag: String,
}

impl CommandPayload {
    /// 解码容器字节
    pub fn container_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.container)
    }
}

impl From<&CommandDefinition> for CommandPayload {
    fn from(definition: &CommandDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            kind: definition.kind.clone(),
            interface_descriptor: definition.interface_descriptor.clone(),
            container: BASE64.encode(&definition.container),
            revision_tag: definition.revision_tag.clone(),
        }
    }
}

/// 全量同步响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPayload {
    pub commands: Vec<CommandPayload>,
    pub total_count: usize,
    pub freshness_marker: String,
}

impl From<&CatalogSnapshot> for CatalogPayload {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        Self {
            commands: snapshot
                .commands
                .iter()
                .map(|d| CommandPayload::from(d.as_ref()))
                .collect(),
            total_count: snapshot.total_count,
            freshness_marker: snapshot.freshness_marker.clone(),
        }
    }
}

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthPayload {
    pub service: String,
    pub status: String,
}

/// 解析一行请求并交给服务处理
pub fn dispatch(service: &DefinitionService, line: &str) -> RpcResponse {
    let request: RpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return RpcResponse::error(
                None,
                StatusCode::InvalidArgument,
                format!("malformed request: {}", e),
            )
        }
    };

    handle_request(service, &request)
}

/// 处理已解析的请求
pub fn handle_request(service: &DefinitionService, request: &RpcRequest) -> RpcResponse {
    let id = request.id;

    match request.method.as_str() {
        METHOD_GET_COMMAND => {
            // 缺省的 name 按空串处理，先鉴权再报参数错误
            let name = match request.params.get("name") {
                None | Some(Value::Null) => "",
                Some(Value::String(name)) => name.as_str(),
                Some(_) => {
                    if let Err(e) = service.authorize(&request.metadata, METHOD_GET_COMMAND) {
                        return RpcResponse::from_definition_error(id, &e);
                    }
                    return RpcResponse::error(
                        id,
                        StatusCode::InvalidArgument,
                        "'name' must be a string",
                    );
                }
            };

            match service.get_command(&request.metadata, name) {
                Ok(definition) => RpcResponse::ok(id, &CommandPayload::from(definition.as_ref())),
                Err(e) => RpcResponse::from_definition_error(id, &e),
            }
        }
        METHOD_SYNC_CATALOG => match service.sync_catalog(&request.metadata) {
            Ok(snapshot) => RpcResponse::ok(id, &CatalogPayload::from(&snapshot)),
            Err(e) => RpcResponse::from_definition_error(id, &e),
        },
        METHOD_HEALTH => RpcResponse::ok(
            id,
            &HealthPayload {
                service: SERVICE_NAME.to_string(),
                status: "SERVING".to_string(),
            },
        ),
        other => RpcResponse::error(
            id,
            StatusCode::Unimplemented,
            format!("unknown method '{}'", other),
        ),
    }
}
