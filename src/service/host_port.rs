use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostPortError {
    #[error("missing port in address {0:?}")]
    MissingPort(String),

    #[error("missing ']' in address {0:?}")]
    MissingBracket(String),

    #[error("too many colons in address {0:?}")]
    TooManyColons(String),

    #[error("unexpected bracket in address {0:?}")]
    UnexpectedBracket(String),
}

/// Splits `host:port` or `[host]:port` into host and port.
///
/// The port is not validated and may be empty. IPv6 literals must be
/// bracketed, so `"::1"` is rejected with [`HostPortError::TooManyColons`].
pub fn split_host_port(hostport: &str) -> Result<(&str, &str), HostPortError> {
    let error_address = || hostport.to_owned();

    let last_colon = hostport
        .rfind(':')
        .ok_or_else(|| HostPortError::MissingPort(error_address()))?;

    let (host, host_start, port_search_start) = if hostport.starts_with('[') {
        let close_bracket = hostport
            .find(']')
            .ok_or_else(|| HostPortError::MissingBracket(error_address()))?;

        let after_bracket = close_bracket + 1;
        if after_bracket == hostport.len() {
            return Err(HostPortError::MissingPort(error_address()));
        }
        if after_bracket != last_colon {
            return Err(if hostport.as_bytes()[after_bracket] == b':' {
                HostPortError::TooManyColons(error_address())
            } else {
                HostPortError::MissingPort(error_address())
            });
        }

        (&hostport[1..close_bracket], 1, after_bracket)
    } else {
        let host = &hostport[..last_colon];
        if host.contains(':') {
            return Err(HostPortError::TooManyColons(error_address()));
        }
        (host, 0, 0)
    };

    if hostport[host_start..].contains('[') || hostport[port_search_start..].contains(']') {
        return Err(HostPortError::UnexpectedBracket(error_address()));
    }

    Ok((host, &hostport[last_colon + 1..]))
}
