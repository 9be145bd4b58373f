// handlers/elevated/admin/mod.rs - Field administration (/api/admin/*)

pub mod events;      // create, update, cancel, attendance lists
pub mod submissions; // verification review queue
pub mod users;       // users of managed fields
