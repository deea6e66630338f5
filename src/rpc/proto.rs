//! `ProxyService` message schema
//!
//! Hand-declared prost messages; field names and tags match the original
//! protobuf contract, so the wire format stays stable for existing callers.

use prost::Message;

use crate::models;

/// RPC method selector carried in the request envelope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum Method {
    Unknown = 0,
    GetProxyGroups = 1,
    GetProxyGroup = 2,
    PickProxy = 3,
}

/// Status codes, numbered as gRPC does
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    FailedPrecondition = 9,
    Unimplemented = 12,
    Internal = 13,
}

/// Request envelope: which method to invoke and its encoded payload
#[derive(Clone, PartialEq, Message)]
pub struct RpcRequest {
    #[prost(enumeration = "Method", tag = "1")]
    pub method: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub body: Vec<u8>,
}

/// Response envelope: status, optional diagnostic, encoded payload
#[derive(Clone, PartialEq, Message)]
pub struct RpcResponse {
    #[prost(enumeration = "StatusCode", tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(bytes = "vec", tag = "3")]
    pub body: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Proxy {
    #[prost(string, tag = "1")]
    pub ip: String,
    #[prost(string, tag = "2")]
    pub usr: String,
    #[prost(string, tag = "3")]
    pub psw: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProxyGroup {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, repeated, tag = "3")]
    pub proxies: Vec<Proxy>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProxyGroupsRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct ProxyGroupsResponse {
    #[prost(message, repeated, tag = "1")]
    pub groups: Vec<ProxyGroup>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProxyGroupRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProxyGroupResponse {
    #[prost(message, optional, tag = "1")]
    pub group: Option<ProxyGroup>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PickProxyRequest {
    #[prost(string, tag = "1")]
    pub group_id: String,
    /// Rotation strategy name; empty means the server default
    #[prost(string, tag = "2")]
    pub strategy: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct PickProxyResponse {
    #[prost(message, optional, tag = "1")]
    pub proxy: Option<Proxy>,
}

impl From<&models::Proxy> for Proxy {
    fn from(proxy: &models::Proxy) -> Self {
        Self {
            ip: proxy.address.clone(),
            usr: proxy.username.clone(),
            psw: proxy.password.clone(),
        }
    }
}

impl From<&models::ProxyGroup> for ProxyGroup {
    fn from(group: &models::ProxyGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            proxies: group.proxies.iter().map(Proxy::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let request = RpcRequest {
            method: Method::GetProxyGroups as i32,
            body: ProxyGroupsRequest {}.encode_to_vec(),
        };

        let bytes = request.encode_to_vec();
        let decoded = RpcRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(Method::try_from(decoded.method), Ok(Method::GetProxyGroups));
    }

    #[test]
    fn test_group_conversion_keeps_wire_field_names() {
        let group = models::ProxyGroup::new(
            "1",
            "default",
            vec![models::Proxy::new("10.0.0.1:8080", "a", "b")],
        );

        let wire = ProxyGroup::from(&group);
        assert_eq!(wire.id, "1");
        assert_eq!(wire.name, "default");
        assert_eq!(wire.proxies[0].ip, "10.0.0.1:8080");
        assert_eq!(wire.proxies[0].usr, "a");
        assert_eq!(wire.proxies[0].psw, "b");
    }

    #[test]
    fn test_unknown_method_value_fails_enum_conversion() {
        assert!(Method::try_from(42).is_err());
    }
}
