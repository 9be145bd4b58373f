pub mod accounts;
pub mod database;
pub mod fields;
pub mod ping;
pub mod seed;
