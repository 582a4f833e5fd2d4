pub mod extract;
pub mod jwt;
pub mod password;

pub use extract::{AccessIdentity, RefreshIdentity};
pub use jwt::TokenService;
pub use password::PasswordHasher;
