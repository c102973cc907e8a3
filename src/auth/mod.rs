//! Authentication module
//!
//! Password hashing, access token (JWT) issuance and validation, refresh token
//! lifecycle, and bearer header parsing.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use bearer::{
    extract_bearer, get_bearer_token, get_refresh_token, BearerError, BEARER_PREFIX,
    REFRESH_TOKEN_HEADER,
};
pub use claims::{Claims, ISSUER};
pub use jwt::{make_jwt, validate_jwt, AccessTokenCodec, AccessTokenError};
pub use password::{
    hash_password, verify_password, BcryptHasher, PasswordError, PasswordHasher,
    PASSWORD_HASH_COST,
};
pub use refresh_token::{
    create_refresh_token, generate_refresh_token, lookup_refresh_token, revoke_refresh_token,
    validate_refresh_token, RefreshTokenError, RefreshTokenRecord, RefreshTokenStore, TokenState,
};
