use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use serde::Serialize;

use tracing::warn;

use std::{fmt, io};

use crate::service::request_info_service::{ClientAddress, HeaderSnapshot, ProxyChain};

pub const CONTENT_JSON: &str = "application/json";
pub const CONTENT_TEXT: &str = "text/plain";

/// Response branch, chosen from the request's own `Content-Type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

impl ResponseFormat {
    /// Only an exact `application/json` selects JSON. `Accept` is ignored.
    pub fn negotiate(headers: &HeaderMap) -> Self {
        match headers.get(header::CONTENT_TYPE) {
            Some(content_type) if content_type.as_bytes() == CONTENT_JSON.as_bytes() => {
                Self::Json
            }
            _ => Self::Text,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => CONTENT_TEXT,
            Self::Json => CONTENT_JSON,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RenderedResponse {
    pub format: ResponseFormat,
    pub status: StatusCode,
    pub body: String,
}

impl RenderedResponse {
    fn ok(format: ResponseFormat, body: String) -> Self {
        Self {
            format,
            status: StatusCode::OK,
            body,
        }
    }
}

impl IntoResponse for RenderedResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(self.format.content_type()),
            )],
            self.body,
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct IpInfoDTO<'a> {
    ip: &'a str,
    ip_proxy: String,
}

#[derive(Debug, Serialize)]
struct UserAgentDTO<'a> {
    #[serde(rename = "user-agent")]
    user_agent: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorDTO<'a> {
    status: &'static str,
    message: &'a str,
}

/// Writes `{"key": "value", "key": "value"}`, a space after every `:` and `,`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn to_json(value: &impl Serialize) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    value.serialize(&mut serializer)?;

    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn render_error(
    format: ResponseFormat,
    status: StatusCode,
    message: fmt::Arguments<'_>,
) -> RenderedResponse {
    let message = message.to_string();

    let body = match format {
        ResponseFormat::Json => to_json(&ErrorDTO {
            status: "error",
            message: &message,
        })
        .unwrap_or_else(|err| {
            warn!("error encoding error body: {}", err);
            String::new()
        }),
        ResponseFormat::Text => format!("{} {}", status.as_u16(), message),
    };

    RenderedResponse {
        format,
        status,
        body,
    }
}

pub fn render_ip_info(
    format: ResponseFormat,
    client_address: &ClientAddress,
    proxy_chain: &ProxyChain,
) -> RenderedResponse {
    match format {
        ResponseFormat::Json => {
            let dto = IpInfoDTO {
                ip: client_address.as_str(),
                ip_proxy: proxy_chain.to_string(),
            };
            match to_json(&dto) {
                Ok(body) => RenderedResponse::ok(format, body),
                Err(err) => {
                    warn!("error encoding ip info: {}", err);
                    render_error(
                        format,
                        StatusCode::BAD_REQUEST,
                        format_args!("could not parse client ip address"),
                    )
                }
            }
        }
        ResponseFormat::Text => RenderedResponse::ok(format, client_address.to_string()),
    }
}

pub fn render_user_agent(format: ResponseFormat, user_agent: &str) -> RenderedResponse {
    match format {
        ResponseFormat::Json => match to_json(&UserAgentDTO { user_agent }) {
            Ok(body) => RenderedResponse::ok(format, body),
            Err(err) => {
                warn!("error encoding user agent: {}", err);
                render_error(
                    format,
                    StatusCode::BAD_REQUEST,
                    format_args!("could not parse user agent"),
                )
            }
        },
        ResponseFormat::Text => RenderedResponse::ok(format, user_agent.to_owned()),
    }
}

pub fn render_headers(format: ResponseFormat, headers: &HeaderSnapshot) -> RenderedResponse {
    match format {
        ResponseFormat::Json => match serde_json::to_string(headers) {
            Ok(body) => RenderedResponse::ok(format, body),
            Err(err) => {
                warn!("error encoding headers: {}", err);
                render_error(
                    format,
                    StatusCode::BAD_REQUEST,
                    format_args!("could not parse request headers"),
                )
            }
        },
        ResponseFormat::Text => {
            // BTreeMap iterates in ascending name order
            let body = headers
                .iter()
                .map(|(name, value)| format!("{name}: {value}\n"))
                .collect();
            RenderedResponse::ok(format, body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn negotiate_exact_json_only() {
        assert_eq!(
            ResponseFormat::negotiate(&headers_with_content_type("application/json")),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::negotiate(&headers_with_content_type(
                "application/json; charset=utf-8"
            )),
            ResponseFormat::Text
        );
        assert_eq!(
            ResponseFormat::negotiate(&headers_with_content_type("text/plain")),
            ResponseFormat::Text
        );
        assert_eq!(
            ResponseFormat::negotiate(&HeaderMap::new()),
            ResponseFormat::Text
        );
    }

    #[test]
    fn negotiate_ignores_accept() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        assert_eq!(ResponseFormat::negotiate(&headers), ResponseFormat::Text);
    }

    #[test]
    fn error_bodies() {
        let json = render_error(
            ResponseFormat::Json,
            StatusCode::NOT_FOUND,
            format_args!("page {} found", "not"),
        );
        assert_eq!(json.status, StatusCode::NOT_FOUND);
        assert_eq!(
            json.body,
            r#"{"status": "error", "message": "page not found"}"#
        );

        let text = render_error(
            ResponseFormat::Text,
            StatusCode::NOT_FOUND,
            format_args!("page not found"),
        );
        assert_eq!(text.status, StatusCode::NOT_FOUND);
        assert_eq!(text.body, "404 page not found");
    }

    #[test]
    fn user_agent_json_is_escaped() {
        let rendered = render_user_agent(ResponseFormat::Json, r#"evil "agent""#);

        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(rendered.body, r#"{"user-agent": "evil \"agent\""}"#);
    }

    #[test]
    fn ip_info_json_layout() {
        let rendered = render_ip_info(
            ResponseFormat::Json,
            &ClientAddress::from("1.2.3.4"),
            &ProxyChain::default(),
        );

        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(rendered.body, r#"{"ip": "1.2.3.4", "ip_proxy": "[]"}"#);
    }

    #[test]
    fn headers_json_is_compact_and_sorted() {
        let headers: HeaderSnapshot = [
            ("x-test".to_owned(), "a,b".to_owned()),
            ("accept".to_owned(), "*/*".to_owned()),
        ]
        .into_iter()
        .collect();

        let rendered = render_headers(ResponseFormat::Json, &headers);

        assert_eq!(rendered.body, r#"{"accept":"*/*","x-test":"a,b"}"#);
    }

    #[test]
    fn headers_text_sorted_lines() {
        let headers: HeaderSnapshot = [
            ("x-test".to_owned(), "a,b".to_owned()),
            ("accept".to_owned(), "*/*".to_owned()),
            ("host".to_owned(), "localhost".to_owned()),
        ]
        .into_iter()
        .collect();

        let rendered = render_headers(ResponseFormat::Text, &headers);

        assert_eq!(
            rendered.body,
            "accept: */*\nhost: localhost\nx-test: a,b\n"
        );
    }

    #[test]
    fn headers_empty_text_body() {
        let rendered = render_headers(ResponseFormat::Text, &HeaderSnapshot::new());

        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(rendered.body, "");
    }

    #[test]
    fn rendered_response_sets_content_type() {
        let response = render_user_agent(ResponseFormat::Json, "curl").into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            CONTENT_JSON
        );

        let response = render_user_agent(ResponseFormat::Text, "curl").into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            CONTENT_TEXT
        );
    }
}
