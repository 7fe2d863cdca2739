use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

use tokio::time::Instant;

use tracing::info;

use std::{sync::Arc, time::Duration};

use crate::{request::InboundRequest, service::request_info_service};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessLogEntry {
    pub client_address: String,
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub latency: Duration,
}

pub trait AccessLogSink {
    fn record(&self, entry: &AccessLogEntry);
}

pub type DynAccessLogSink = Arc<dyn AccessLogSink + Send + Sync>;

/// Writes one INFO event per request: `client - METHOD path status latency`.
struct TracingAccessLogSink;

impl AccessLogSink for TracingAccessLogSink {
    fn record(&self, entry: &AccessLogEntry) {
        info!(
            "{} - {} {} {} {:?}",
            entry.client_address,
            entry.method,
            entry.path,
            entry.status.as_u16(),
            entry.latency,
        );
    }
}

pub fn new_tracing_access_log_sink() -> DynAccessLogSink {
    Arc::new(TracingAccessLogSink)
}

pub async fn access_log(
    State(sink): State<DynAccessLogSink>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let inbound_request = InboundRequest::from_parts(&parts);
    let request = Request::from_parts(parts, body);

    let start_time = Instant::now();
    let response = next.run(request).await;
    let latency = start_time.elapsed();

    let client_address = request_info_service::derive_client_address(&inbound_request);

    sink.record(&AccessLogEntry {
        client_address: client_address.to_string(),
        method: inbound_request.method,
        path: inbound_request.path,
        status: response.status(),
        latency,
    });

    response
}
