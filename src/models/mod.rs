pub mod book;
pub mod credentials;
pub mod identity;
pub mod token;

pub use book::Book;
pub use credentials::{AuthGrant, AuthResponse, LoginRequest, SignupRequest};
pub use identity::{Identity, ADMIN_ROLE};
pub use token::{decode_token, TokenClaims};
