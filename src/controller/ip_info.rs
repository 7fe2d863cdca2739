use crate::{
    controller::{ControllerError, require_get},
    request::InboundRequest,
    service::{request_info_service, response_service},
};

pub async fn ip_info(
    request: InboundRequest,
) -> Result<response_service::RenderedResponse, ControllerError> {
    let format = require_get(&request)?;

    let client_address = request_info_service::derive_client_address(&request);
    let proxy_chain = request_info_service::derive_proxy_chain(&request);

    Ok(response_service::render_ip_info(
        format,
        &client_address,
        &proxy_chain,
    ))
}
