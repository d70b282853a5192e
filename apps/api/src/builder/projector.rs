//! Form-state → markdown projection.
//!
//! Pure and deterministic: the same `ResumeFormState` and display name always
//! produce byte-identical markdown. The heading vocabulary is fixed because the
//! saved markdown is displayed as-is and never parsed back into fields.

use crate::builder::form::{present, ContactInfo, Entry, ResumeFormState};

pub const SUMMARY_HEADING: &str = "Professional Summary";
pub const SKILLS_HEADING: &str = "Skills";
pub const EXPERIENCE_HEADING: &str = "Work Experience";
pub const EDUCATION_HEADING: &str = "Education";
pub const PROJECTS_HEADING: &str = "Projects";

const SECTION_SEPARATOR: &str = "\n\n";
const CONTACT_SEPARATOR: &str = " | ";

/// Icon prefix per contact field, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Email,
    Mobile,
    LinkedIn,
    Twitter,
}

impl ContactField {
    pub const ALL: [ContactField; 4] = [
        ContactField::Email,
        ContactField::Mobile,
        ContactField::LinkedIn,
        ContactField::Twitter,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            ContactField::Email => "📧",
            ContactField::Mobile => "📱",
            ContactField::LinkedIn => "💼",
            ContactField::Twitter => "🐦",
        }
    }

    fn value(self, contact: &ContactInfo) -> Option<&str> {
        match self {
            ContactField::Email => present(&contact.email),
            ContactField::Mobile => present(&contact.mobile),
            ContactField::LinkedIn => present(&contact.linkedin),
            ContactField::Twitter => present(&contact.twitter),
        }
    }

    fn token(self, value: &str) -> String {
        match self {
            ContactField::Email | ContactField::Mobile => format!("{} {}", self.icon(), value),
            ContactField::LinkedIn => format!("{} [LinkedIn]({})", self.icon(), value),
            ContactField::Twitter => format!("{} [Twitter]({})", self.icon(), value),
        }
    }
}

/// Projects the whole form into one markdown document.
///
/// Sections appear in a fixed order; empty ones are dropped entirely and the
/// rest are separated by one blank line.
pub fn project(state: &ResumeFormState, display_name: &str) -> String {
    let sections = [
        contact_markdown(&state.contact_info, display_name),
        text_section(SUMMARY_HEADING, &state.summary),
        text_section(SKILLS_HEADING, &state.skills),
        entries_to_markdown(&state.experience, EXPERIENCE_HEADING),
        entries_to_markdown(&state.education, EDUCATION_HEADING),
        entries_to_markdown(&state.projects, PROJECTS_HEADING),
    ];

    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

/// Centered name + contact links. Empty when no contact field is present,
/// regardless of the display name.
pub fn contact_markdown(contact: &ContactInfo, display_name: &str) -> String {
    let parts: Vec<String> = ContactField::ALL
        .iter()
        .filter_map(|field| field.value(contact).map(|v| field.token(v)))
        .collect();

    if parts.is_empty() {
        return String::new();
    }

    format!(
        "## <div align=\"center\">{}</div>\n\n<div align=\"center\">\n\n{}\n\n</div>",
        display_name.trim(),
        parts.join(CONTACT_SEPARATOR)
    )
}

/// Shared transform for experience, education and projects.
/// An empty list yields an empty string, so the heading disappears too.
pub fn entries_to_markdown(entries: &[Entry], heading: &str) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let body = entries
        .iter()
        .map(entry_markdown)
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR);

    format!("## {heading}\n\n{body}")
}

fn entry_markdown(entry: &Entry) -> String {
    format!(
        "### {} @ {}\n{}\n\n{}",
        entry.title,
        entry.organization,
        date_range(entry),
        entry.description
    )
}

fn date_range(entry: &Entry) -> String {
    if entry.current {
        format!("{} - Present", entry.start_date)
    } else {
        format!(
            "{} - {}",
            entry.start_date,
            entry.end_date.as_deref().unwrap_or_default()
        )
    }
}

fn text_section(heading: &str, body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!("## {heading}\n\n{body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, current: bool) -> Entry {
        Entry {
            title: title.to_string(),
            organization: "Acme".to_string(),
            start_date: "Jan 2021".to_string(),
            end_date: if current { None } else { Some("Dec 2022".to_string()) },
            description: "Shipped the billing pipeline".to_string(),
            current,
        }
    }

    fn full_state() -> ResumeFormState {
        ResumeFormState {
            contact_info: ContactInfo {
                email: Some("ada@example.com".to_string()),
                mobile: Some("+1 555 0100".to_string()),
                linkedin: Some("https://linkedin.com/in/ada".to_string()),
                twitter: Some("https://twitter.com/ada".to_string()),
            },
            summary: "Systems engineer.".to_string(),
            skills: "Rust, SQL".to_string(),
            experience: vec![entry("Engineer", true), entry("Intern", false)],
            education: vec![entry("BSc", false)],
            projects: vec![entry("Compiler", false)],
        }
    }

    fn icon_count(markdown: &str) -> usize {
        ContactField::ALL
            .iter()
            .filter(|f| markdown.contains(f.icon()))
            .count()
    }

    #[test]
    fn test_no_contact_fields_renders_no_contact_block() {
        let mut state = full_state();
        state.contact_info = ContactInfo::default();
        let md = project(&state, "Ada Lovelace");
        assert!(!md.contains("<div align=\"center\">"));
        assert!(!md.contains("Ada Lovelace"));
        assert!(md.starts_with("## Professional Summary"));
    }

    #[test]
    fn test_blank_contact_fields_count_as_absent() {
        let contact = ContactInfo {
            email: Some("  ".to_string()),
            mobile: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(contact_markdown(&contact, "Ada"), "");
    }

    #[test]
    fn test_single_contact_field_yields_single_token() {
        let cases = [
            (
                ContactInfo {
                    email: Some("ada@example.com".to_string()),
                    ..Default::default()
                },
                "📧 ada@example.com",
            ),
            (
                ContactInfo {
                    mobile: Some("+1 555 0100".to_string()),
                    ..Default::default()
                },
                "📱 +1 555 0100",
            ),
            (
                ContactInfo {
                    linkedin: Some("https://linkedin.com/in/ada".to_string()),
                    ..Default::default()
                },
                "💼 [LinkedIn](https://linkedin.com/in/ada)",
            ),
            (
                ContactInfo {
                    twitter: Some("https://twitter.com/ada".to_string()),
                    ..Default::default()
                },
                "🐦 [Twitter](https://twitter.com/ada)",
            ),
        ];

        for (contact, expected) in cases {
            let md = contact_markdown(&contact, "Ada");
            assert!(md.contains(expected), "missing {expected} in {md}");
            assert_eq!(icon_count(&md), 1);
            assert!(!md.contains(CONTACT_SEPARATOR));
        }
    }

    #[test]
    fn test_contact_block_layout() {
        let contact = ContactInfo {
            email: Some("ada@example.com".to_string()),
            twitter: Some("https://twitter.com/ada".to_string()),
            ..Default::default()
        };
        assert_eq!(
            contact_markdown(&contact, "Ada Lovelace"),
            "## <div align=\"center\">Ada Lovelace</div>\n\n<div align=\"center\">\n\n\
             📧 ada@example.com | 🐦 [Twitter](https://twitter.com/ada)\n\n</div>"
        );
    }

    #[test]
    fn test_projection_is_deterministic() {
        let state = full_state();
        assert_eq!(project(&state, "Ada"), project(&state, "Ada"));
    }

    #[test]
    fn test_empty_lists_omit_section_headers() {
        let mut state = full_state();
        state.experience.clear();
        state.education.clear();
        state.projects.clear();
        let md = project(&state, "Ada");
        assert!(!md.contains("## Work Experience"));
        assert!(!md.contains("## Education"));
        assert!(!md.contains("## Projects"));
        assert!(md.ends_with("## Skills\n\nRust, SQL"));
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let md = project(&full_state(), "Ada");
        let positions: Vec<usize> = [
            "## Professional Summary",
            "## Skills",
            "## Work Experience",
            "## Education",
            "## Projects",
        ]
        .iter()
        .map(|h| md.find(h).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_entry_rendering() {
        let md = entries_to_markdown(&[entry("Engineer", true), entry("Intern", false)], "Work Experience");
        assert_eq!(
            md,
            "## Work Experience\n\n\
             ### Engineer @ Acme\nJan 2021 - Present\n\nShipped the billing pipeline\n\n\
             ### Intern @ Acme\nJan 2021 - Dec 2022\n\nShipped the billing pipeline"
        );
    }

    #[test]
    fn test_empty_form_projects_to_empty_string() {
        assert_eq!(project(&ResumeFormState::default(), "Ada"), "");
    }
}
