use std::io;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

pub type RpcResult<T> = Result<T, RpcError>;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("RPC I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("RPC frame error: {0}")]
    Frame(#[from] LinesCodecError),
    #[error("Response encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RpcError {
    pub fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}
