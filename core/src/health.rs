//! Lightweight backend liveness probe.
//!
//! The prober has its own transport and shorter timeout and bypasses the
//! dispatcher entirely: it only needs a boolean. Probing happens only when a
//! caller asks; there is no background polling.

use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown,
    Probing,
    Available,
    Unavailable,
}

pub struct HealthProber<T = UreqTransport> {
    base_url: String,
    transport: T,
    state: Mutex<HealthState>,
}

impl HealthProber<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_url, config.health_timeout)
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self::with_transport(base_url, UreqTransport::new(timeout))
    }
}

impl<T: Transport> HealthProber<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            state: Mutex::new(HealthState::Unknown),
        }
    }

    pub fn state(&self) -> HealthState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Probe `GET <base>/`. Any 2xx is healthy; every failure is `false`.
    pub fn check_health(&self) -> bool {
        self.set_state(HealthState::Probing);
        let request = HttpRequest::new(HttpMethod::Get, format!("{}/", self.base_url));
        let available = match self.transport.execute(&request) {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!(url = %request.url, error = %e, "health probe failed");
                false
            }
        };
        self.set_state(if available {
            HealthState::Available
        } else {
            HealthState::Unavailable
        });
        available
    }

    /// Banner text for the current state, or `None` before the first probe.
    pub fn status_message(&self) -> Option<String> {
        match self.state() {
            HealthState::Available => Some(format!(
                "Backend API is connected and running at {}",
                self.base_url
            )),
            HealthState::Unavailable => Some(format!(
                "Backend API is not available at {}. Please ensure the backend is running.",
                self.base_url
            )),
            HealthState::Unknown | HealthState::Probing => None,
        }
    }

    fn set_state(&self, state: HealthState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}
