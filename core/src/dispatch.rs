//! Issue requests, time-bound them and normalise the outcome.

use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::classify::classify;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::transport::Transport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Sends `HttpRequest`s through a `Transport` and classifies the responses.
///
/// The timeout lives in the transport; `DrugClient::from_config` builds a
/// `UreqTransport` with the configured request timeout.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `request` and classify the response.
    ///
    /// `content-type: application/json` and an `x-request-id` are added unless
    /// the caller already set them.
    pub fn dispatch(&self, mut request: HttpRequest) -> Result<Option<Value>, ApiError> {
        request.set_default_header("content-type", "application/json");
        request.set_default_header(REQUEST_ID_HEADER, &Uuid::new_v4().to_string());
        let request_id = request.header(REQUEST_ID_HEADER).unwrap_or_default().to_string();

        debug!(
            url = %request.url,
            method = request.method.as_str(),
            body = request.body.as_deref().unwrap_or(""),
            request_id = %request_id,
            "API request"
        );

        let response = self.transport.execute(&request).map_err(|e| {
            error!(url = %request.url, request_id = %request_id, error = %e, "API transport failure");
            e.into_api_error(&request.url)
        })?;

        debug!(
            url = %request.url,
            status = response.status,
            request_id = %request_id,
            "API response"
        );
        classify(&response)
    }
}
