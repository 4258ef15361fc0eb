//! Token issuing and verification shared by the identity slice and the auth extractors.

mod error;
mod jwt;

pub use error::{SecurityError, SecurityErrorExt};
pub use jwt::{Claims, IssuedToken, JwtCodec, TokenPurpose};
