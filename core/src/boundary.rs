//! Render-pass error boundary.
//!
//! Wraps a render closure so that a panic or an `Err` anywhere beneath it
//! turns into a fallback view with a reset action instead of tearing down the
//! shell. State machine: `Healthy -> Failed -> (reset) -> Healthy`.

use std::any::Any;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState {
    Healthy,
    Failed { message: String },
}

/// Action offered by the fallback view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Clear the failure and render again, without restarting anything.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackView {
    pub title: String,
    pub description: String,
    pub action_label: String,
    pub action: RecoveryAction,
    /// The captured failure, shown only when debug info is enabled.
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    View(T),
    Fallback(FallbackView),
}

#[derive(Debug)]
pub struct ErrorBoundary {
    state: BoundaryState,
    fallback: Option<FallbackView>,
}

impl Default for ErrorBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorBoundary {
    pub fn new() -> Self {
        Self {
            state: BoundaryState::Healthy,
            fallback: None,
        }
    }

    /// Use `view` instead of the built-in fallback. Its `detail` is replaced
    /// by the captured failure.
    pub fn with_fallback(view: FallbackView) -> Self {
        Self {
            state: BoundaryState::Healthy,
            fallback: Some(view),
        }
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    /// Run `render` unless the boundary has already failed.
    pub fn render<T, E, F>(&mut self, render: F) -> Rendered<T>
    where
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        if let BoundaryState::Failed { message } = &self.state {
            return Rendered::Fallback(self.fallback_view(message));
        }

        let message = match catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(view)) => return Rendered::View(view),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        error!(error = %message, "error boundary caught a render failure");
        let view = self.fallback_view(&message);
        self.state = BoundaryState::Failed { message };
        Rendered::Fallback(view)
    }

    /// The user's reset action.
    pub fn reset(&mut self) {
        self.state = BoundaryState::Healthy;
    }

    fn fallback_view(&self, message: &str) -> FallbackView {
        let mut view = self.fallback.clone().unwrap_or_else(|| FallbackView {
            title: "Something went wrong".to_string(),
            description: "An unexpected error occurred. Please try again.".to_string(),
            action_label: "Try Again".to_string(),
            action: RecoveryAction::Reset,
            detail: String::new(),
        });
        view.detail = message.to_string();
        view
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "render panicked".to_string()
    }
}
