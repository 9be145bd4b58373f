// handlers/elevated/root/mod.rs - Super admin operations (/api/root/*)

pub mod field_admins; // field admin assignment and removal
pub mod fields;       // field catalogue maintenance
pub mod users;        // account activation
