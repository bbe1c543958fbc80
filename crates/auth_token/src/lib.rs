mod error;
mod jwt;

pub use error::Error;
pub use jwt::{
    AuthTokenClaims, AuthTokenHeader, TokenClass, TOKEN_VERSION, sign_hs256, verify_hs256,
};
