//! Shared types used across the API layer.

pub mod pagination;
pub mod response;

pub use pagination::{PageQuery, Paginated, PaginationMeta};
pub use response::{ApiResponse, Created, NoContent};
