pub mod cache;
pub mod catalogue;
pub mod errors;
pub mod filters;
pub mod models;
pub mod repo;
pub mod repository;
pub mod stats;
pub mod stream;

pub use cache::*;
pub use catalogue::*;
pub use errors::*;
pub use filters::*;
pub use models::*;
pub use repo::*;
pub use repository::*;
pub use stats::*;
pub use stream::*;
