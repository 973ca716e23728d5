//! Client-side data access and form handling for the drug database.
//!
//! # Overview
//! Builds `HttpRequest` values and classifies `HttpResponse` values without
//! touching the network. A `Transport` executes the round-trip; the default
//! one uses `ureq` with the configured timeout, and tests plug in stubs.
//!
//! # Design
//! - `DrugClient` holds the base URL and a `Dispatcher`. Each operation is a
//!   `build_*` call followed by one dispatch, so the I/O boundary is explicit.
//! - Every failure is an `ApiError`. Connectivity and not-found are distinct
//!   variants because the presentation layer words them differently.
//! - `HealthProber` never goes through the dispatcher; it only needs a bool.
//! - Form state, the dialog submit and the error boundary hold no network
//!   state of their own. They are plain values a UI shell drives.
//! - `ClientConfig` is resolved once and passed in; nothing reads the
//!   environment behind the caller's back.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod boundary;
pub mod classify;
pub mod client;
pub mod config;
pub mod dialog;
pub mod dispatch;
pub mod error;
pub mod fallback;
pub mod form;
pub mod health;
pub mod http;
pub mod logging;
pub mod presentation;
pub mod search;
pub mod transport;
pub mod types;

pub use boundary::{BoundaryState, ErrorBoundary, FallbackView, Rendered};
pub use classify::classify;
pub use client::DrugClient;
pub use config::{ClientConfig, ConfigError, Environment};
pub use dialog::{DialogMode, DrugDialog, SubmitOutcome};
pub use dispatch::Dispatcher;
pub use error::{ApiError, FieldErrors, TransportError};
pub use form::{DrugForm, FormField, TokenList, ValidationError};
pub use health::{HealthProber, HealthState};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use presentation::{delete_drug_with_notice, user_message, FailureKind, Toast, ToastVariant};
pub use search::LatestOnly;
pub use transport::{Transport, UreqTransport};
pub use types::{Category, Drug, DrugDraft, DrugFilter};
