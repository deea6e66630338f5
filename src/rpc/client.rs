//! Client for the `ProxyService` RPC contract
//!
//! Used by automation workers to fetch proxy configuration, and by the test
//! suite to exercise the server over a real TCP connection.

use prost::Message;
use tokio::io::BufStream;
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{Result, StardustError};
use crate::rpc::proto::{
    Method, PickProxyRequest, PickProxyResponse, Proxy, ProxyGroup, ProxyGroupRequest,
    ProxyGroupResponse, ProxyGroupsRequest, ProxyGroupsResponse, RpcRequest, RpcResponse,
    StatusCode,
};
use crate::rpc::wire::{read_frame, write_frame};

/// One connection to a `ProxyService` endpoint; calls are issued in sequence
pub struct RpcClient {
    stream: BufStream<TcpStream>,
}

impl RpcClient {
    /// Connect to a server address
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream: BufStream::new(stream),
        })
    }

    /// Fetch the full proxy group snapshot
    pub async fn get_proxy_groups(&mut self) -> Result<Vec<ProxyGroup>> {
        let response: ProxyGroupsResponse = self
            .call(Method::GetProxyGroups, &ProxyGroupsRequest {})
            .await?;
        Ok(response.groups)
    }

    /// Fetch a single group by identifier
    pub async fn get_proxy_group(&mut self, id: &str) -> Result<ProxyGroup> {
        let response: ProxyGroupResponse = self
            .call(
                Method::GetProxyGroup,
                &ProxyGroupRequest { id: id.to_string() },
            )
            .await?;
        response
            .group
            .ok_or_else(|| StardustError::Rpc("response missing group payload".to_string()))
    }

    /// Ask the server to select one proxy from a group.
    ///
    /// An empty strategy string lets the server apply its default.
    pub async fn pick_proxy(&mut self, group_id: &str, strategy: &str) -> Result<Proxy> {
        let response: PickProxyResponse = self
            .call(
                Method::PickProxy,
                &PickProxyRequest {
                    group_id: group_id.to_string(),
                    strategy: strategy.to_string(),
                },
            )
            .await?;
        response
            .proxy
            .ok_or_else(|| StardustError::Rpc("response missing proxy payload".to_string()))
    }

    async fn call<Req, Resp>(&mut self, method: Method, request: &Req) -> Result<Resp>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let envelope = RpcRequest {
            method: method as i32,
            body: request.encode_to_vec(),
        };
        write_frame(&mut self.stream, &envelope).await?;

        let response: RpcResponse = read_frame(&mut self.stream)
            .await?
            .ok_or_else(|| StardustError::Rpc("connection closed mid-call".to_string()))?;

        match StatusCode::try_from(response.status) {
            Ok(StatusCode::Ok) => Resp::decode(response.body.as_slice())
                .map_err(|e| StardustError::Rpc(format!("malformed response payload: {}", e))),
            Ok(StatusCode::NotFound) => Err(StardustError::NotFound(response.message)),
            Ok(StatusCode::InvalidArgument) => Err(StardustError::InvalidArgument(response.message)),
            Ok(StatusCode::DeadlineExceeded) => Err(StardustError::Timeout),
            Ok(code) => Err(StardustError::Rpc(format!(
                "{:?}: {}",
                code, response.message
            ))),
            Err(_) => Err(StardustError::Rpc(format!(
                "unknown status {}: {}",
                response.status, response.message
            ))),
        }
    }
}
