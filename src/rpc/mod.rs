//! RPC 传输层
//!
//! 行分隔 JSON over TCP，提供 GetCommand、SyncCatalog、Health 三个方法。

pub mod error;
pub mod protocol;
pub mod server;

pub use error::{RpcError, RpcResult};
pub use protocol::{
    dispatch, handle_request, CatalogPayload, CommandPayload, HealthPayload, RpcRequest,
    RpcResponse, StatusCode, METHOD_GET_COMMAND, METHOD_HEALTH, METHOD_SYNC_CATALOG, SERVICE_NAME,
};
pub use server::{RpcServer, MAX_FRAME_BYTES};
