pub mod models;
pub mod websites;

pub use models::*;
pub use websites::normalize_websites;
