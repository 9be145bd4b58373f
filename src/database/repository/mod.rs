//! Parameterized SQL for each table. Functions take any Postgres executor so
//! they run equally against the pool or inside a transaction (`&mut *tx`).

pub mod attendance;
pub mod events;
pub mod field_admins;
pub mod fields;
pub mod notifications;
pub mod profiles;
pub mod submissions;
pub mod users;
