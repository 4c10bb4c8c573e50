mod middleware;
mod password;
mod policy;
mod token;

pub use middleware::{AuthError, RequireIdentity};
pub use password::{MIN_PASSWORD_LENGTH, hash_password, verify_password};
pub use policy::{AuthPolicy, BearerTokenPolicy, FixedIdentityPolicy};
pub use token::{IssuedToken, TokenGenerator, parse_token};
