use axum::{
    extract::{ConnectInfo, FromRequestParts, connect_info::MockConnectInfo},
    http::{Extensions, HeaderMap, Method, request::Parts},
};

use tracing::debug;

use std::{convert::Infallible, net::SocketAddr};

/// Read-only view of an inbound request, detached from its body.
#[derive(Clone, Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub remote_addr: String,
    pub headers: HeaderMap,
}

impl InboundRequest {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_owned(),
            remote_addr: remote_addr(&parts.extensions),
            headers: parts.headers.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for InboundRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Socket address of the peer as `host:port`, empty when the listener did not
/// record connect info. Falls back to `MockConnectInfo` the same way axum's
/// `ConnectInfo` extractor does.
pub fn remote_addr(extensions: &Extensions) -> String {
    let addr = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr)
        .or_else(|| {
            extensions
                .get::<MockConnectInfo<SocketAddr>>()
                .map(|MockConnectInfo(addr)| addr)
        });

    match addr {
        Some(addr) => addr.to_string(),
        None => {
            debug!("no connect info on request");
            String::new()
        }
    }
}
