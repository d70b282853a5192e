// Resume builder: form state, markdown projection, validation and the preview draft.
// Everything here is pure; persistence lives in `resume`, export in `export`.

pub mod draft;
pub mod form;
pub mod handlers;
pub mod projector;
pub mod validation;

pub use draft::{PreviewSource, ResumeDraft};
pub use form::{ContactInfo, Entry, ResumeFormState};
pub use projector::{entries_to_markdown, project};
