// Saved resumes: one markdown document per user.

pub mod handlers;
pub mod store;

pub use store::{PgResumeStore, ResumeStore};
