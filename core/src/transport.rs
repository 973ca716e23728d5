//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. `UreqTransport` is the
//! production implementation; its agent carries a global timeout so a stalled
//! request is aborted at the socket rather than raced by a timer. Tests plug in
//! in-process transports instead.

use std::io;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations return `Ok` for every HTTP response, including 4xx/5xx;
/// status interpretation belongs to the classifier.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        // Status codes are data here, not errors.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, err: ureq::Error) -> TransportError {
        match &err {
            ureq::Error::Timeout(_) => TransportError::Timeout(self.timeout),
            ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
                TransportError::Unreachable(err.to_string())
            }
            ureq::Error::Io(io_err) if io_err.kind() == io::ErrorKind::TimedOut => {
                TransportError::Timeout(self.timeout)
            }
            ureq::Error::Io(io_err) if is_unreachable(io_err.kind()) => {
                TransportError::Unreachable(err.to_string())
            }
            _ => TransportError::Other(err.to_string()),
        }
    }
}

fn is_unreachable(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
    )
}

fn apply_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref();

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => apply_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => apply_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                apply_headers(self.agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => apply_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                apply_headers(self.agent.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => apply_headers(self.agent.put(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.map_error(e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process transports for unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays queued outcomes and records every request it sees.
    #[derive(Default)]
    pub struct StubTransport {
        outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        pub requests: Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        pub fn with(outcomes: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::default(),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for StubTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no stubbed response".into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_connection_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = UreqTransport::new(Duration::from_secs(2));
        let err = transport
            .execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/")))
            .unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)), "got {err:?}");
    }

    #[test]
    fn silent_server_times_out() {
        // Accepts the connection (via the backlog) but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = UreqTransport::new(Duration::from_millis(300));
        let started = std::time::Instant::now();
        let err = transport
            .execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/drugs")))
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout(Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }
}
