use serde::{Deserialize, Serialize};

/// A single egress endpoint with credentials.
///
/// Immutable once created. Credentials are never serialized into API
/// responses; log the address only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    /// Network address as `host:port`
    pub address: String,
    #[serde(default, skip_serializing)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl Proxy {
    pub fn new(address: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Split the address into host and port, if well-formed
    pub fn host_port(&self) -> Option<(&str, u16)> {
        let (host, port) = self.address.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        let port: u16 = port.parse().ok()?;
        Some((host, port))
    }
}

/// A named, identified collection of proxies.
///
/// Member order is preserved and drives rotation priority. A group may be
/// empty, but its identifier must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub proxies: Vec<Proxy>,
}

impl ProxyGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, proxies: Vec<Proxy>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            proxies,
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

/// Request body for upserting a group; the identifier comes from the path
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertGroupRequest {
    pub name: String,
    #[serde(default)]
    pub proxies: Vec<Proxy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port_parsing() {
        let proxy = Proxy::new("10.0.0.1:8080", "a", "b");
        assert_eq!(proxy.host_port(), Some(("10.0.0.1", 8080)));

        assert_eq!(Proxy::new("noport", "", "").host_port(), None);
        assert_eq!(Proxy::new(":8080", "", "").host_port(), None);
        assert_eq!(Proxy::new("host:notaport", "", "").host_port(), None);
        assert_eq!(Proxy::new("host:99999", "", "").host_port(), None);
    }

    #[test]
    fn test_credentials_not_serialized() {
        let proxy = Proxy::new("10.0.0.1:8080", "user", "secret");
        let json = serde_json::to_string(&proxy).unwrap();

        assert!(json.contains("10.0.0.1:8080"));
        assert!(!json.contains("user"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_proxy_deserializes_without_credentials() {
        let proxy: Proxy = serde_json::from_str(r#"{"address":"10.0.0.1:8080"}"#).unwrap();
        assert_eq!(proxy.address, "10.0.0.1:8080");
        assert!(proxy.username.is_empty());
        assert!(proxy.password.is_empty());
    }

    #[test]
    fn test_group_len_and_empty() {
        let group = ProxyGroup::new("1", "default", vec![]);
        assert!(group.is_empty());
        assert_eq!(group.len(), 0);

        let group = ProxyGroup::new("1", "default", vec![Proxy::new("10.0.0.1:8080", "a", "b")]);
        assert!(!group.is_empty());
        assert_eq!(group.len(), 1);
    }
}
