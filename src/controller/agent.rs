use crate::{
    controller::{ControllerError, require_get},
    request::InboundRequest,
    service::{request_info_service, response_service},
};

pub async fn user_agent(
    request: InboundRequest,
) -> Result<response_service::RenderedResponse, ControllerError> {
    let format = require_get(&request)?;

    let user_agent = request_info_service::derive_user_agent(&request);

    Ok(response_service::render_user_agent(format, &user_agent))
}
