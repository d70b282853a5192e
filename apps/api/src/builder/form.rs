use serde::{Deserialize, Serialize};

/// Contact fields shown in the centered header block. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
}

/// One experience, education or project record. The same shape serves all three lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Entry {
    pub title: String,
    pub organization: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: String,
    /// Ongoing position: rendered as `start - Present`, no end date needed.
    pub current: bool,
}

/// Structured resume form as edited by the user.
///
/// Never rebuilt from saved markdown; loading a saved resume only restores the
/// markdown, not these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResumeFormState {
    pub contact_info: ContactInfo,
    pub summary: String,
    pub skills: String,
    pub experience: Vec<Entry>,
    pub education: Vec<Entry>,
    pub projects: Vec<Entry>,
}

/// Returns the trimmed value when present and non-blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
