use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::builder::form::{Entry, ResumeFormState};

pub const INVALID_EMAIL: &str = "Invalid email address";
pub const SUMMARY_REQUIRED: &str = "Professional summary is required";
pub const SKILLS_REQUIRED: &str = "Skills are required";
pub const END_DATE_REQUIRED: &str = "End date is required unless this is your current position";

/// Field path (`contactInfo.email`, `experience.0.title`) → first error message.
///
/// Each error is reported against the field that caused it, so a client can
/// show it inline and leave the other fields alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Records an error; the first message for a path wins.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(path, message)| format!("{path}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Validates the full form. Returns every failing field, not just the first.
pub fn validate_form(state: &ResumeFormState) -> FieldErrors {
    let mut errors = FieldErrors::default();

    let email = state.contact_info.email.as_deref().unwrap_or_default().trim();
    if !is_valid_email(email) {
        errors.insert("contactInfo.email", INVALID_EMAIL);
    }
    if state.summary.trim().is_empty() {
        errors.insert("summary", SUMMARY_REQUIRED);
    }
    if state.skills.trim().is_empty() {
        errors.insert("skills", SKILLS_REQUIRED);
    }

    for (list, entries) in [
        ("experience", &state.experience),
        ("education", &state.education),
        ("projects", &state.projects),
    ] {
        for (i, entry) in entries.iter().enumerate() {
            validate_entry(entry, &format!("{list}.{i}"), &mut errors);
        }
    }

    errors
}

/// Validates one entry, writing errors under `prefix`.
pub fn validate_entry(entry: &Entry, prefix: &str, errors: &mut FieldErrors) {
    let required = [
        ("title", &entry.title, "Title is required"),
        ("organization", &entry.organization, "Organization is required"),
        ("startDate", &entry.start_date, "Start date is required"),
        ("description", &entry.description, "Description is required"),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            errors.insert(format!("{prefix}.{field}"), message);
        }
    }

    let has_end = entry
        .end_date
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if !entry.current && !has_end {
        errors.insert(format!("{prefix}.endDate"), END_DATE_REQUIRED);
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
