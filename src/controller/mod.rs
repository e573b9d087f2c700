pub mod auth;
pub mod member;

pub use auth::AuthController;
pub use member::MemberController;
