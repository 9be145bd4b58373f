pub mod event;
pub mod field;
pub mod field_admin;
pub mod notification;
pub mod profile;
pub mod submission;
pub mod user;

pub use event::{Attendance, Attendee, Event, EventSummary};
pub use field::Field;
pub use field_admin::{FieldAdmin, FieldAdminView};
pub use notification::Notification;
pub use profile::{DirectoryEntry, Profile};
pub use submission::{Submission, SubmissionWithUser};
pub use user::User;
