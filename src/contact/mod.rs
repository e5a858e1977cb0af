/// Contact form
///
/// Holds the three free-text fields, their validation messages and the
/// submission lifecycle:
///
/// - `Editing` -> (validate) -> `Editing` with errors, or `Submitting`
/// - `Submitting` -> `Submitted`, or back to `Editing` with a `submission` error
/// - `Submitted` -> `Editing` only through `reset`
///
/// Submission is split into `begin_submit` / `finish_submit` so callers can
/// release their lock on the form while the create call is in flight.

pub mod validation;

pub use validation::validate;

use crate::{
    content::{ContactSubmission, ContentClient, ContentError},
    metrics,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info};

/// Shown when the create call fails; the underlying error is only logged
pub const SUBMISSION_FAILED_MESSAGE: &str = "Unable to send your message. Please try again shortly.";
pub const SUCCESS_TITLE: &str = "Message Sent Successfully!";
pub const SUCCESS_MESSAGE: &str =
    "Thank you for reaching out! I'll review your message and get back to you within 24-48 hours.";

/// Editable field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    FullName,
    EmailAddress,
    MessageContent,
}

/// Keys of the error map: one per field plus the submission failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKey {
    FullName,
    EmailAddress,
    MessageContent,
    Submission,
}

impl From<FormField> for ErrorKey {
    fn from(field: FormField) -> Self {
        match field {
            FormField::FullName => ErrorKey::FullName,
            FormField::EmailAddress => ErrorKey::EmailAddress,
            FormField::MessageContent => ErrorKey::MessageContent,
        }
    }
}

/// Error messages by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<ErrorKey, String>);

impl ValidationErrors {
    pub fn insert(&mut self, key: ErrorKey, message: impl Into<String>) {
        self.0.insert(key, message.into());
    }

    pub fn remove(&mut self, key: ErrorKey) {
        self.0.remove(&key);
    }

    pub fn get(&self, key: ErrorKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: ErrorKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = ErrorKey> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub full_name: String,
    pub email_address: String,
    pub message_content: String,
}

impl ContactFields {
    fn slot(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::FullName => &mut self.full_name,
            FormField::EmailAddress => &mut self.email_address,
            FormField::MessageContent => &mut self.message_content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPhase {
    Editing,
    Submitting,
    Submitted,
}

impl std::fmt::Display for FormPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormPhase::Editing => "editing",
            FormPhase::Submitting => "submitting",
            FormPhase::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// Illegal transition for the current phase
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("form is not editable while {0}")]
    NotEditable(FormPhase),

    #[error("no submission in flight (form is {0})")]
    NotSubmitting(FormPhase),

    #[error("form can only be reset after a successful submission (form is {0})")]
    NotSubmitted(FormPhase),
}

/// How a submit attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitOutcome {
    /// Validation failed; no network call was made
    Invalid,
    Submitted,
    Failed,
}

impl SubmitOutcome {
    fn as_str(self) -> &'static str {
        match self {
            SubmitOutcome::Invalid => "invalid",
            SubmitOutcome::Submitted => "submitted",
            SubmitOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessNotice {
    pub title: &'static str,
    pub message: &'static str,
}

/// Serializable view of the form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormSnapshot {
    pub phase: FormPhase,
    pub fields: ContactFields,
    pub errors: ValidationErrors,
    pub read_only: bool,
    pub submit_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessNotice>,
}

#[derive(Debug, Clone)]
pub struct ContactForm {
    fields: ContactFields,
    errors: ValidationErrors,
    phase: FormPhase,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactForm {
    pub fn new() -> Self {
        Self {
            fields: ContactFields::default(),
            errors: ValidationErrors::default(),
            phase: FormPhase::Editing,
        }
    }

    pub fn fields(&self) -> &ContactFields {
        &self.fields
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Set one field and drop that field's validation message
    pub fn update_field(&mut self, field: FormField, value: impl Into<String>) -> Result<(), FormError> {
        if self.phase != FormPhase::Editing {
            return Err(FormError::NotEditable(self.phase));
        }
        *self.fields.slot(field) = value.into();
        self.errors.remove(field.into());
        Ok(())
    }

    pub fn validate(&self) -> ValidationErrors {
        validate(&self.fields)
    }

    /// Validate and, when clean, enter `Submitting`
    ///
    /// Returns the document to create, or `None` when validation failed (the
    /// errors are stored on the form and nothing may be sent).
    pub fn begin_submit(&mut self) -> Result<Option<ContactSubmission>, FormError> {
        if self.phase != FormPhase::Editing {
            return Err(FormError::NotEditable(self.phase));
        }

        let errors = self.validate();
        if !errors.is_empty() {
            self.errors = errors;
            metrics::record_contact_submission(SubmitOutcome::Invalid.as_str());
            return Ok(None);
        }

        self.errors.clear();
        self.phase = FormPhase::Submitting;
        Ok(Some(ContactSubmission::new(
            &self.fields.full_name,
            &self.fields.email_address,
            &self.fields.message_content,
        )))
    }

    /// Apply the outcome of the create call started by `begin_submit`
    pub fn finish_submit(&mut self, result: Result<Value, ContentError>) -> Result<SubmitOutcome, FormError> {
        if self.phase != FormPhase::Submitting {
            return Err(FormError::NotSubmitting(self.phase));
        }

        let outcome = match result {
            Ok(created) => {
                let id = created.get("_id").and_then(Value::as_str).unwrap_or("unknown");
                info!(id, "contact submission stored");
                self.phase = FormPhase::Submitted;
                SubmitOutcome::Submitted
            }
            Err(e) => {
                error!(error = %e, "contact submission failed");
                self.phase = FormPhase::Editing;
                self.errors.insert(ErrorKey::Submission, SUBMISSION_FAILED_MESSAGE);
                SubmitOutcome::Failed
            }
        };

        metrics::record_contact_submission(outcome.as_str());
        Ok(outcome)
    }

    /// Validate, send and record the result in one step
    pub async fn submit(&mut self, client: &dyn ContentClient) -> Result<SubmitOutcome, FormError> {
        let Some(submission) = self.begin_submit()? else {
            return Ok(SubmitOutcome::Invalid);
        };
        let result = send_submission(client, &submission).await;
        self.finish_submit(result)
    }

    /// Clear everything after a successful submission
    pub fn reset(&mut self) -> Result<(), FormError> {
        if self.phase != FormPhase::Submitted {
            return Err(FormError::NotSubmitted(self.phase));
        }
        self.fields = ContactFields::default();
        self.errors.clear();
        self.phase = FormPhase::Editing;
        Ok(())
    }

    pub fn snapshot(&self) -> ContactFormSnapshot {
        ContactFormSnapshot {
            phase: self.phase,
            fields: self.fields.clone(),
            errors: self.errors.clone(),
            read_only: self.phase != FormPhase::Editing,
            submit_label: match self.phase {
                FormPhase::Submitting => "Sending Message...",
                _ => "Send Message",
            },
            success: (self.phase == FormPhase::Submitted).then_some(SuccessNotice {
                title: SUCCESS_TITLE,
                message: SUCCESS_MESSAGE,
            }),
        }
    }
}

/// Issue the single create call for a submission
pub async fn send_submission(
    client: &dyn ContentClient,
    submission: &ContactSubmission,
) -> Result<Value, ContentError> {
    let document = serde_json::to_value(submission)
        .map_err(|e| ContentError::InvalidDocument(e.to_string()))?;
    client.create(document).await
}
