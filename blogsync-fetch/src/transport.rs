//! HTTP transport seam.
//!
//! [`Transport`] is the only place network I/O happens. [`UreqTransport`] is
//! the production implementation; tests substitute closures.

use std::error::Error as _;
use std::io;
use std::time::Duration;

use blogsync_core::SyncConfig;

use crate::error::{FailureCause, TransportError};

/// A GET request: URL plus query parameters, encoded by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    /// `X-WP-TotalPages`, when the endpoint is paginated.
    pub total_pages: Option<u32>,
}

impl Response {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            total_pages: None,
        }
    }

    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = Some(total_pages);
        self
    }
}

/// Performs one HTTP GET. Implementations classify failures into
/// [`FailureCause`] themselves; callers never inspect error text.
pub trait Transport {
    fn get(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&Request) -> Result<Response, TransportError>,
{
    fn get(&self, request: &Request) -> Result<Response, TransportError> {
        self(request)
    }
}

// ---------------------------------------------------------------------------
// ureq
// ---------------------------------------------------------------------------

/// Blocking HTTP transport backed by a shared `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.timeout(), &config.user_agent())
    }
}

impl Transport for UreqTransport {
    fn get(&self, request: &Request) -> Result<Response, TransportError> {
        let mut call = self.agent.get(&request.url);
        for (key, value) in &request.query {
            call = call.query(key, value);
        }

        match call.call() {
            Ok(response) => {
                let status = response.status();
                let total_pages = response
                    .header("X-WP-TotalPages")
                    .and_then(|v| v.trim().parse::<u32>().ok());
                let body = response.into_string().map_err(|source| TransportError::Body {
                    url: request.url.clone(),
                    source,
                })?;
                Ok(Response {
                    status,
                    body,
                    total_pages,
                })
            }
            Err(ureq::Error::Status(status, _)) => Err(TransportError::Status {
                url: request.url.clone(),
                status,
            }),
            Err(ureq::Error::Transport(transport)) => Err(TransportError::Network {
                url: request.url.clone(),
                cause: classify(&transport),
                detail: transport.to_string(),
            }),
        }
    }
}

fn classify(transport: &ureq::Transport) -> FailureCause {
    if io_timed_out(transport) {
        return FailureCause::Timeout;
    }
    match transport.kind() {
        ureq::ErrorKind::Dns => FailureCause::Dns,
        ureq::ErrorKind::ConnectionFailed => FailureCause::Refused,
        _ => FailureCause::Other,
    }
}

fn io_timed_out(transport: &ureq::Transport) -> bool {
    transport
        .source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|err| matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_keeps_param_order() {
        let req = Request::new("http://wp/posts")
            .query("page", 2)
            .query("per_page", 10);
        assert_eq!(req.param("page"), Some("2"));
        assert_eq!(req.param("missing"), None);
        assert_eq!(req.query[1], ("per_page".to_string(), "10".to_string()));
    }

    #[test]
    fn closures_are_transports() {
        let transport = |req: &Request| -> Result<Response, TransportError> {
            Ok(Response::json(format!("\"{}\"", req.url)))
        };
        let response = transport.get(&Request::new("u")).unwrap();
        assert_eq!(response.body, "\"u\"");
        assert_eq!(response.status, 200);
    }
}
