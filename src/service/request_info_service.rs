use axum::http::{HeaderMap, HeaderValue, header};

use itertools::Itertools;

use tracing::debug;

use std::{borrow::Cow, collections::BTreeMap, fmt};

use crate::{request::InboundRequest, service::host_port::split_host_port};

const PROXY_LIST_SEPARATOR: &str = ", ";

const UNKNOWN_PROXY: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientAddress(String);

impl ClientAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
impl From<&str> for ClientAddress {
    fn from(address: &str) -> Self {
        Self(address.to_owned())
    }
}

impl fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hosts from `X-Forwarded-For` in header order, `"*"` for hops without a
/// parseable `host:port`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyChain(Vec<String>);

impl ProxyChain {
    pub fn hops(&self) -> &[String] {
        &self.0
    }
}

// Renders as `[a b c]`, the form the `ip_proxy` JSON field carries.
impl fmt::Display for ProxyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.hops().iter().join(" "))
    }
}

pub type HeaderSnapshot = BTreeMap<String, String>;

fn header_value_str(value: &HeaderValue) -> Cow<'_, str> {
    match value.to_str() {
        Ok(value_str) => Cow::Borrowed(value_str),
        Err(_) => String::from_utf8_lossy(value.as_bytes()),
    }
}

fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers.get(name).map(header_value_str)
}

pub fn split_ip_list(ip_list: &str) -> Vec<&str> {
    ip_list
        .split(PROXY_LIST_SEPARATOR)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .collect()
}

fn forwarded_for_list(request: &InboundRequest) -> Vec<String> {
    first_header_value(&request.headers, "x-forwarded-for")
        .map(|value| {
            split_ip_list(&value)
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub fn derive_client_address(request: &InboundRequest) -> ClientAddress {
    let candidate = forwarded_for_list(request)
        .into_iter()
        .next()
        .unwrap_or_else(|| request.remote_addr.clone());

    match split_host_port(&candidate) {
        Ok((host, _port)) => ClientAddress(host.to_owned()),
        Err(err) => {
            debug!("using client address as-is: {}", err);
            ClientAddress(candidate)
        }
    }
}

pub fn derive_proxy_chain(request: &InboundRequest) -> ProxyChain {
    ProxyChain(
        forwarded_for_list(request)
            .iter()
            .map(|hostport| match split_host_port(hostport) {
                Ok((host, _port)) => host.to_owned(),
                Err(err) => {
                    debug!("unknown proxy hop: {}", err);
                    UNKNOWN_PROXY.to_owned()
                }
            })
            .collect(),
    )
}

/// `Host` is request-line metadata rather than a header of the caller's, so it
/// is left out.
pub fn derive_header_snapshot(request: &InboundRequest) -> HeaderSnapshot {
    request
        .headers
        .keys()
        .filter(|name| **name != header::HOST)
        .map(|name| {
            let value = request
                .headers
                .get_all(name)
                .iter()
                .map(header_value_str)
                .join(",");

            (name.as_str().to_lowercase(), value)
        })
        .collect()
}

pub fn derive_user_agent(request: &InboundRequest) -> String {
    first_header_value(&request.headers, header::USER_AGENT.as_str())
        .map(Cow::into_owned)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{HeaderName, Method};

    fn inbound_request(remote_addr: &str, headers: &[(&str, &str)]) -> InboundRequest {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }

        InboundRequest {
            method: Method::GET,
            path: "/".to_owned(),
            remote_addr: remote_addr.to_owned(),
            headers: header_map,
        }
    }

    #[test]
    fn client_address_without_forwarded_for_strips_port() {
        let request = inbound_request("192.0.2.7:51234", &[]);
        assert_eq!(derive_client_address(&request).as_str(), "192.0.2.7");

        let request = inbound_request("[2001:db8::1]:443", &[]);
        assert_eq!(derive_client_address(&request).as_str(), "2001:db8::1");
    }

    #[test]
    fn client_address_falls_back_to_raw_socket_string() {
        let request = inbound_request("unix-socket", &[]);
        assert_eq!(derive_client_address(&request).as_str(), "unix-socket");
    }

    #[test]
    fn forwarded_for_with_ports() {
        let request = inbound_request(
            "10.0.0.1:80",
            &[("X-Forwarded-For", "1.2.3.4:5, 9.9.9.9:10")],
        );

        assert_eq!(derive_client_address(&request).as_str(), "1.2.3.4");
        assert_eq!(
            derive_proxy_chain(&request).hops(),
            ["1.2.3.4".to_owned(), "9.9.9.9".to_owned()]
        );
    }

    #[test]
    fn forwarded_for_hop_without_port_is_unknown() {
        let request = inbound_request("10.0.0.1:80", &[("X-Forwarded-For", "1.2.3.4:5, 9.9.9.9")]);

        assert_eq!(derive_client_address(&request).as_str(), "1.2.3.4");
        assert_eq!(
            derive_proxy_chain(&request).hops(),
            ["1.2.3.4".to_owned(), "*".to_owned()]
        );
    }

    #[test]
    fn forwarded_for_unparseable() {
        let request = inbound_request(
            "10.0.0.1:80",
            &[("X-Forwarded-For", "not-a-valid-hostport")],
        );

        assert_eq!(
            derive_client_address(&request).as_str(),
            "not-a-valid-hostport"
        );
        assert_eq!(derive_proxy_chain(&request).hops(), ["*".to_owned()]);
    }

    #[test]
    fn forwarded_for_blank_segments_are_dropped() {
        assert_eq!(
            split_ip_list("  , 1.2.3.4:1, , 5.6.7.8:2, "),
            vec!["1.2.3.4:1", "5.6.7.8:2"]
        );

        let request = inbound_request("10.0.0.1:80", &[("X-Forwarded-For", "  , 1.2.3.4:1")]);
        assert_eq!(derive_client_address(&request).as_str(), "1.2.3.4");

        let request = inbound_request("10.0.0.1:80", &[("X-Forwarded-For", "   ")]);
        assert_eq!(derive_client_address(&request).as_str(), "10.0.0.1");
        assert!(derive_proxy_chain(&request).hops().is_empty());
    }

    #[test]
    fn proxy_chain_empty_without_header() {
        let request = inbound_request("10.0.0.1:80", &[]);
        let proxy_chain = derive_proxy_chain(&request);

        assert!(proxy_chain.hops().is_empty());
        assert_eq!(proxy_chain.to_string(), "[]");
    }

    #[test]
    fn proxy_chain_display() {
        let request = inbound_request(
            "10.0.0.1:80",
            &[("X-Forwarded-For", "1.2.3.4:5, bogus, [::1]:9")],
        );

        assert_eq!(derive_proxy_chain(&request).to_string(), "[1.2.3.4 * ::1]");
    }

    #[test]
    fn header_snapshot_joins_repeated_values_in_order() {
        let request = inbound_request(
            "10.0.0.1:80",
            &[("X-Test", "a"), ("Accept", "*/*"), ("x-test", "b")],
        );

        let snapshot = derive_header_snapshot(&request);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["x-test"], "a,b");
        assert_eq!(snapshot["accept"], "*/*");
        assert_eq!(
            snapshot.keys().collect::<Vec<_>>(),
            vec!["accept", "x-test"]
        );
    }

    #[test]
    fn header_snapshot_omits_host() {
        let request = inbound_request(
            "10.0.0.1:80",
            &[("Host", "example.com"), ("Accept", "*/*")],
        );

        let snapshot = derive_header_snapshot(&request);

        assert!(!snapshot.contains_key("host"));
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["accept"]);
    }

    #[test]
    fn header_snapshot_decodes_opaque_values_lossily() {
        let mut request = inbound_request("10.0.0.1:80", &[]);
        request.headers.insert(
            HeaderName::from_static("x-bytes"),
            HeaderValue::from_bytes(b"ok\xff").unwrap(),
        );

        let snapshot = derive_header_snapshot(&request);

        assert_eq!(snapshot["x-bytes"], "ok\u{fffd}");
    }

    #[test]
    fn user_agent_defaults_to_empty() {
        let request = inbound_request("10.0.0.1:80", &[]);
        assert_eq!(derive_user_agent(&request), "");

        let request = inbound_request("10.0.0.1:80", &[("User-Agent", "curl/8.5.0")]);
        assert_eq!(derive_user_agent(&request), "curl/8.5.0");
    }
}
