//! Create/edit dialog: validation, single-flight submit and error mapping.
//!
//! # Design
//! The form sits behind a mutex so a UI thread can keep editing and rendering
//! while a worker thread runs `submit`. The lock is released for the duration
//! of the network call; the in-flight flag is what suppresses a second submit
//! until the first one resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use crate::client::DrugClient;
use crate::error::ApiError;
use crate::form::{DrugForm, ValidationError};
use crate::presentation::Toast;
use crate::transport::Transport;
use crate::types::Drug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit { id: String },
}

/// Result of one `DrugDialog::submit` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend stored the drug; the draft has been discarded.
    Saved(Drug),
    /// Local validation failed; nothing was sent.
    Invalid(Vec<ValidationError>),
    /// Another submit was already in flight; nothing was sent.
    Suppressed,
    /// The backend rejected specific fields; they are now the form's errors.
    /// `notice` carries messages for keys that match no field.
    Rejected { notice: Option<Toast> },
    /// Any other failure, rendered for the user.
    Failed { error: ApiError, notice: Toast },
}

/// One open create/edit dialog.
pub struct DrugDialog<'a, T: Transport> {
    client: &'a DrugClient<T>,
    mode: DialogMode,
    form: Mutex<DrugForm>,
    submitting: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'f>(&'f AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<'a, T: Transport> DrugDialog<'a, T> {
    pub fn create(client: &'a DrugClient<T>) -> Self {
        Self::open(client, DialogMode::Create, DrugForm::new())
    }

    pub fn edit(client: &'a DrugClient<T>, drug: &Drug) -> Self {
        Self::open(
            client,
            DialogMode::Edit {
                id: drug.id.clone(),
            },
            DrugForm::for_edit(drug),
        )
    }

    fn open(client: &'a DrugClient<T>, mode: DialogMode, form: DrugForm) -> Self {
        Self {
            client,
            mode,
            form: Mutex::new(form),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> &DialogMode {
        &self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            DialogMode::Create => "Add New Drug",
            DialogMode::Edit { .. } => "Edit Drug",
        }
    }

    /// Lock the form for editing or rendering.
    pub fn form(&self) -> MutexGuard<'_, DrugForm> {
        self.form.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the submit action should be disabled.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Validate and send the draft.
    pub fn submit(&self) -> SubmitOutcome {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("submit suppressed, another save is in flight");
            return SubmitOutcome::Suppressed;
        }
        let _in_flight = InFlight(&self.submitting);

        let draft = match self.form().validate() {
            Ok(draft) => draft,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };

        let result = match &self.mode {
            DialogMode::Create => self.client.create_drug(&draft),
            DialogMode::Edit { id } => self.client.update_drug(id, &draft),
        };

        match result {
            Ok(drug) => {
                *self.form() = DrugForm::new();
                info!(drug_id = %drug.id, "drug saved");
                SubmitOutcome::Saved(drug)
            }
            Err(error) => {
                warn!(error = %error, "failed to save drug");
                if error.is_connectivity() {
                    let notice = Toast::for_error(&error);
                    return SubmitOutcome::Failed { error, notice };
                }
                if let Some(field_errors) = error.field_errors() {
                    let unmatched = self.form().apply_server_errors(field_errors);
                    let notice = (!unmatched.is_empty())
                        .then(|| Toast::destructive("Error", unmatched.join("; ")));
                    return SubmitOutcome::Rejected { notice };
                }
                let notice = Toast::for_error(&error);
                SubmitOutcome::Failed { error, notice }
            }
        }
    }
}
