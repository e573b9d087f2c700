pub mod member;
pub mod user;

pub use member::Member;
pub use user::{HashedPassword, Role, User, UserDomainError};
