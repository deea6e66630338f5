//! `ProxyService` RPC server
//!
//! Connection-oriented TCP server in front of the registry. Every accepted
//! connection gets its own task; in-flight calls across all connections are
//! bounded by a semaphore so slow clients cannot starve the rest, and each
//! response write runs under a deadline so a stalled peer cannot pin its
//! connection task.

use std::sync::Arc;
use std::time::Duration;

use prost::Message;
use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::RpcServerConfig;
use crate::error::{Result, StardustError};
use crate::registry::{Registry, RotationStrategy};
use crate::rpc::proto::{
    Method, PickProxyRequest, PickProxyResponse, ProxyGroupRequest, ProxyGroupResponse,
    ProxyGroupsResponse, RpcRequest, RpcResponse, StatusCode,
};
use crate::rpc::wire::{read_frame, write_frame};

/// RPC server for the proxy registry
pub struct RpcServer {
    config: RpcServerConfig,
    registry: Arc<Registry>,
    in_flight: Arc<Semaphore>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, registry: Arc<Registry>) -> Self {
        let in_flight = Arc::new(Semaphore::new(config.max_in_flight));
        Self {
            config,
            registry,
            in_flight,
        }
    }

    /// Bind the configured address and serve until shutdown
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("RPC server listening on {}", addr);
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already-bound listener
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let call_timeout = Duration::from_secs(self.config.request_timeout);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "RPC connection accepted");
                            let registry = Arc::clone(&self.registry);
                            let in_flight = Arc::clone(&self.in_flight);
                            let conn_shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                handle_connection(stream, registry, in_flight, call_timeout, conn_shutdown)
                                    .await;
                                debug!(peer = %peer, "RPC connection closed");
                            });
                        }
                        Err(e) => warn!("Failed to accept RPC connection: {}", e),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("RPC server shut down");
        Ok(())
    }
}

/// Serve one connection: a loop of request frames answered in order
async fn handle_connection(
    stream: TcpStream,
    registry: Arc<Registry>,
    in_flight: Arc<Semaphore>,
    call_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    loop {
        let request: RpcRequest = tokio::select! {
            frame = read_frame(&mut reader) => {
                match frame {
                    Ok(Some(request)) => request,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Dropping RPC connection: {}", e);
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        let response = match in_flight.acquire().await {
            Ok(_permit) => dispatch(&registry, &request),
            // Semaphore closed only happens during teardown
            Err(_) => break,
        };

        // Dispatch is synchronous; the deadline guards the write, where a
        // peer that stops reading would otherwise pin this task forever
        if let Err(e) = write_response(&mut writer, &response, call_timeout).await {
            warn!("Failed to write RPC response: {}", e);
            break;
        }
    }
}

/// Write one response frame under a deadline
async fn write_response<W>(
    writer: &mut W,
    response: &RpcResponse,
    deadline: Duration,
) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    match timeout(deadline, write_frame(writer, response)).await {
        Ok(result) => result,
        Err(_) => Err(StardustError::Timeout),
    }
}

/// Decode, execute and encode a single call against the registry
fn dispatch(registry: &Registry, request: &RpcRequest) -> RpcResponse {
    match Method::try_from(request.method) {
        Ok(Method::GetProxyGroups) => {
            let groups = registry.list();
            let body = ProxyGroupsResponse {
                groups: groups.iter().map(Into::into).collect(),
            };
            ok_response(&body)
        }
        Ok(Method::GetProxyGroup) => match ProxyGroupRequest::decode(request.body.as_slice()) {
            Ok(req) => match registry.get(&req.id) {
                Ok(group) => ok_response(&ProxyGroupResponse {
                    group: Some((&group).into()),
                }),
                Err(e) => error_response(&e),
            },
            Err(e) => status_response(StatusCode::InvalidArgument, &e.to_string()),
        },
        Ok(Method::PickProxy) => match PickProxyRequest::decode(request.body.as_slice()) {
            Ok(req) => {
                let strategy = if req.strategy.is_empty() {
                    RotationStrategy::default()
                } else {
                    RotationStrategy::from_str(&req.strategy)
                };
                match registry.pick(&req.group_id, strategy) {
                    Ok(proxy) => ok_response(&PickProxyResponse {
                        proxy: Some((&proxy).into()),
                    }),
                    Err(e) => error_response(&e),
                }
            }
            Err(e) => status_response(StatusCode::InvalidArgument, &e.to_string()),
        },
        Ok(Method::Unknown) | Err(_) => {
            status_response(StatusCode::Unimplemented, "unknown ProxyService method")
        }
    }
}

fn ok_response<M: Message>(body: &M) -> RpcResponse {
    RpcResponse {
        status: StatusCode::Ok as i32,
        message: String::new(),
        body: body.encode_to_vec(),
    }
}

fn status_response(status: StatusCode, message: &str) -> RpcResponse {
    RpcResponse {
        status: status as i32,
        message: message.to_string(),
        body: Vec::new(),
    }
}

/// Map a registry error to an RPC status, without leaking internals
fn error_response(error: &StardustError) -> RpcResponse {
    let status = match error {
        StardustError::NotFound(_) => StatusCode::NotFound,
        StardustError::InvalidArgument(_) | StardustError::InvalidRequest(_) => {
            StatusCode::InvalidArgument
        }
        StardustError::EmptyGroup { .. } => StatusCode::FailedPrecondition,
        StardustError::Timeout => StatusCode::DeadlineExceeded,
        _ => StatusCode::Internal,
    };
    status_response(status, &error.to_string())
}
