mod agent;
mod headers;
mod ip_info;


use axum::{
    Router,
    extract::Request,
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
};

use thiserror::Error;

use tower::ServiceBuilder;

use tower_http::timeout::TimeoutLayer;

use std::time::Duration;

use crate::{
    access_log::{self, DynAccessLogSink},
    request::InboundRequest,
    service::response_service::{ResponseFormat, render_error},
};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("page not found")]
    NotFound { format: ResponseFormat },
}

impl ControllerError {
    fn not_found(request: &InboundRequest) -> Self {
        Self::NotFound {
            format: ResponseFormat::negotiate(&request.headers),
        }
    }
}

impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound { format } => {
                render_error(format, StatusCode::NOT_FOUND, format_args!("{}", self))
                    .into_response()
            }
        }
    }
}

/// Every endpoint answers GET only; anything else is treated as an unknown page.
fn require_get(request: &InboundRequest) -> Result<ResponseFormat, ControllerError> {
    if request.method == Method::GET {
        Ok(ResponseFormat::negotiate(&request.headers))
    } else {
        Err(ControllerError::not_found(request))
    }
}

async fn not_found(request: InboundRequest) -> ControllerError {
    ControllerError::not_found(&request)
}

/// `TimeoutLayer` answers with a bare 408; give it the same body shape as
/// every other error.
async fn render_timeout(request: Request, next: Next) -> Response {
    let format = ResponseFormat::negotiate(request.headers());

    let response = next.run(request).await;

    if response.status() == StatusCode::REQUEST_TIMEOUT {
        render_error(
            format,
            StatusCode::REQUEST_TIMEOUT,
            format_args!("request timed out"),
        )
        .into_response()
    } else {
        response
    }
}

pub fn create_routes(access_log_sink: DynAccessLogSink, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", any(ip_info::ip_info))
        .route("/ip", any(ip_info::ip_info))
        .route("/agent", any(agent::user_agent))
        .route("/headers", any(headers::headers))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                // outermost, so timeouts are logged too
                .layer(middleware::from_fn_with_state(
                    access_log_sink,
                    access_log::access_log,
                ))
                .layer(middleware::from_fn(render_timeout))
                .layer(TimeoutLayer::new(request_timeout))
                .into_inner(),
        )
}
