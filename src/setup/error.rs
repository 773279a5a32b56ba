use crate::rpc::RpcError;
use crate::storage::StorageError;
use thiserror::Error;

pub type SetupResult<T> = Result<T, SetupError>;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Catalog database initialization failed: {0}")]
    Database(#[from] StorageError),
    #[error("RPC server initialization failed: {0}")]
    Server(#[from] RpcError),
}
