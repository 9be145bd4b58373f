pub mod extract;
pub mod pagination;
pub mod validation;

pub use extract::{ApiJson, ApiQuery, OptionalApiJson};
pub use pagination::{Page, PageParams, PageWindow};
