//! Multi-step operations that span several tables. Each service owns a pool
//! handle and reports failures through its own error type.

pub mod event_service;
pub mod field_admin_service;
pub mod notification_service;
pub mod user_service;
pub mod verification_service;

pub use event_service::{EventError, EventService};
pub use field_admin_service::{FieldAdminError, FieldAdminService};
pub use user_service::{UserError, UserService};
pub use verification_service::{VerificationError, VerificationService};
