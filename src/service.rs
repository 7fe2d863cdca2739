pub mod host_port;
pub mod request_info_service;
pub mod response_service;
