pub mod member;
pub mod user;

pub use member::{MemberPage, MemberRepository, PgMemberRepository};
pub use user::{PgUserRepository, RepositoryError, UserRepository};
