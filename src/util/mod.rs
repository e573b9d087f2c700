pub mod error;
pub mod password;
pub mod query;
pub mod response;
pub mod token;

pub use error::{AppError, AuthError, BusinessError, ValidationField};
pub use password::{hash_password, verify_password};
pub use query::{ListQuery, QueryOptions, RawListQuery, SortOrder};
pub use response::{ApiResponse, PagedData, Pagination, ResponseBuilder};
pub use token::{Claims, SessionIdentity, TokenConfig, extract_bearer_token, issue_token, verify_token};
