pub mod resume;
pub mod user;

pub use resume::ResumeRecord;
pub use user::{NewUser, UserRecord};
