pub mod assignment;
pub mod course;
pub mod session;

pub use assignment::{AssignmentRecord, SubmissionRecord};
pub use course::CourseRecord;
pub use session::AuthSession;
