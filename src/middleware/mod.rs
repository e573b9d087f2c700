pub mod auth_guard;
pub mod request_id;

pub use auth_guard::{AuthGuard, AuthenticatedUser};
pub use request_id::RequestId;
