//! The preview document: derived from the form, or overridden by hand.
//!
//! Form edits never silently replace hand-edited markdown. While overridden,
//! form updates only mark the override stale; going back to the derived
//! markdown is an explicit `discard_override`.

use serde::Serialize;

use crate::builder::form::ResumeFormState;
use crate::builder::projector::project;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    /// Markdown is the projection of the current form.
    Derived,
    /// Markdown was edited by hand and is kept verbatim.
    Overridden(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSourceKind {
    Derived,
    Overridden,
}

/// Outcome of a form update, so callers can tell the user when their
/// override no longer reflects the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormUpdate {
    Recomputed,
    OverrideKept,
}

#[derive(Debug, Clone)]
pub struct ResumeDraft {
    form: ResumeFormState,
    display_name: String,
    /// Previously saved markdown; shown while the form projects to nothing.
    saved: Option<String>,
    source: PreviewSource,
    stale: bool,
}

impl ResumeDraft {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            form: ResumeFormState::default(),
            display_name: display_name.into(),
            saved: None,
            source: PreviewSource::Derived,
            stale: false,
        }
    }

    /// Starts from saved markdown. The form stays empty: fields are never
    /// reconstructed from markdown.
    pub fn from_saved(saved: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            saved: Some(saved.into()).filter(|s: &String| !s.is_empty()),
            ..Self::new(display_name)
        }
    }

    pub fn form(&self) -> &ResumeFormState {
        &self.form
    }

    pub fn source(&self) -> &PreviewSource {
        &self.source
    }

    pub fn source_kind(&self) -> PreviewSourceKind {
        match self.source {
            PreviewSource::Derived => PreviewSourceKind::Derived,
            PreviewSource::Overridden(_) => PreviewSourceKind::Overridden,
        }
    }

    /// True when the form changed after the markdown was overridden.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn update_form(&mut self, form: ResumeFormState) -> FormUpdate {
        let changed = self.form != form;
        self.form = form;
        match self.source {
            PreviewSource::Derived => FormUpdate::Recomputed,
            PreviewSource::Overridden(_) => {
                self.stale |= changed;
                FormUpdate::OverrideKept
            }
        }
    }

    pub fn override_markdown(&mut self, text: impl Into<String>) {
        self.source = PreviewSource::Overridden(text.into());
        self.stale = false;
    }

    /// Returns to the derived markdown, handing back the discarded text.
    pub fn discard_override(&mut self) -> Option<String> {
        self.stale = false;
        match std::mem::replace(&mut self.source, PreviewSource::Derived) {
            PreviewSource::Overridden(text) => Some(text),
            PreviewSource::Derived => None,
        }
    }

    /// The markdown to preview, save or export.
    pub fn markdown(&self) -> String {
        match &self.source {
            PreviewSource::Overridden(text) => text.clone(),
            PreviewSource::Derived => {
                let projected = project(&self.form, &self.display_name);
                if projected.is_empty() {
                    self.saved.clone().unwrap_or_default()
                } else {
                    projected
                }
            }
        }
    }
}
