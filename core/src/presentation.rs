//! User-facing failure messages and toasts.

use tracing::error;

use crate::client::DrugClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::Drug;

pub const CONNECTIVITY_MESSAGE: &str =
    "Cannot connect to the API server. Please ensure the backend is running.";
pub const NOT_FOUND_MESSAGE: &str = "Drug not found. It may have already been deleted.";
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// The three ways a failure is explained to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connectivity,
    NotFound,
    Other,
}

impl FailureKind {
    pub fn of(error: &ApiError) -> Self {
        match error {
            ApiError::Connectivity { .. } => FailureKind::Connectivity,
            ApiError::NotFound { .. } => FailureKind::NotFound,
            _ => FailureKind::Other,
        }
    }
}

/// Message shown for `error`.
pub fn user_message(error: &ApiError) -> String {
    match FailureKind::of(error) {
        FailureKind::Connectivity => CONNECTIVITY_MESSAGE.to_string(),
        FailureKind::NotFound => NOT_FOUND_MESSAGE.to_string(),
        FailureKind::Other => {
            let message = error.to_string();
            if message.trim().is_empty() {
                GENERIC_MESSAGE.to_string()
            } else {
                message
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// A transient notification for the UI shell to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    pub fn destructive(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }

    pub fn for_error(error: &ApiError) -> Self {
        let title = match FailureKind::of(error) {
            FailureKind::Connectivity => "Connection Error",
            FailureKind::NotFound => "Not Found",
            FailureKind::Other => "Error",
        };
        Self::destructive(title, user_message(error))
    }
}

/// Delete `drug` and describe the outcome.
///
/// Returns the toast to show and whether the drug is gone from the backend,
/// so the caller can drop it from its list.
pub fn delete_drug_with_notice<T: Transport>(client: &DrugClient<T>, drug: &Drug) -> (Toast, bool) {
    match client.delete_drug(&drug.id) {
        Ok(()) => (
            Toast::success(
                "Success",
                format!("{} has been deleted successfully.", drug.name),
            ),
            true,
        ),
        Err(e) => {
            error!(drug_id = %drug.id, error = %e, "failed to delete drug");
            (Toast::for_error(&e), false)
        }
    }
}
