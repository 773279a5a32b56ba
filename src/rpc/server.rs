/*!
 * TCP 服务端
 *
 * 每个连接一个任务，按行读取请求、按行写回响应。同一连接上的请求依次处理。
 */

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use super::error::{RpcError, RpcResult};
use super::protocol::{dispatch, RpcResponse, StatusCode};
use crate::definitions::DefinitionService;

/// 单帧最大字节数
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct RpcServer {
    listener: TcpListener,
    service: Arc<DefinitionService>,
}

impl RpcServer {
    /// 绑定监听地址，失败时返回 [`RpcError::Bind`]
    pub async fn bind(addr: &str, service: Arc<DefinitionService>) -> RpcResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::bind(addr, e))?;
        Ok(Self { listener, service })
    }

    pub fn local_addr(&self) -> RpcResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// 持续服务直到 `shutdown` 完成；已建立的连接任务不受影响
    pub async fn serve_until<F>(self, shutdown: F) -> RpcResult<()>
    where
        F: Future<Output = ()>,
    {
        info!("AVAP Definition Server 监听于 {}", self.local_addr()?);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("收到关闭信号，停止接受新连接");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("新连接: {}", peer);
                        let service = Arc::clone(&self.service);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, service).await {
                                debug!("连接 {} 异常结束: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        warn!("接受连接失败: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(stream: TcpStream, service: Arc<DefinitionService>) -> RpcResult<()> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_BYTES));

    while let Some(frame) = framed.next().await {
        let response = match frame {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                dispatch(&service, &line)
            }
            // 解码出错后帧流随即结束，回一条错误再关闭连接
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                let message = format!("frame exceeds {} bytes", MAX_FRAME_BYTES);
                return reject_frame(&mut framed, message).await;
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                return reject_frame(&mut framed, "request is not valid UTF-8").await;
            }
            Err(e) => return Err(e.into()),
        };

        framed.send(serde_json::to_string(&response)?).await?;
    }

    Ok(())
}

async fn reject_frame(
    framed: &mut Framed<TcpStream, LinesCodec>,
    message: impl Into<String>,
) -> RpcResult<()> {
    let response = RpcResponse::error(None, StatusCode::InvalidArgument, message);
    framed.send(serde_json::to_string(&response)?).await?;
    Ok(())
}
