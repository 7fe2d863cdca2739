use crate::{
    controller::{ControllerError, require_get},
    request::InboundRequest,
    service::{request_info_service, response_service},
};

pub async fn headers(
    request: InboundRequest,
) -> Result<response_service::RenderedResponse, ControllerError> {
    let format = require_get(&request)?;

    let header_snapshot = request_info_service::derive_header_snapshot(&request);

    Ok(response_service::render_headers(format, &header_snapshot))
}
