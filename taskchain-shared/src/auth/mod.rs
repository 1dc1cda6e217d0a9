/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: HS256 access/refresh tokens carrying user id and username
/// - [`token`]: One-time email verification and password reset tokens
///
/// Request authentication (the bearer middleware) lives in the API crate;
/// this module has no HTTP dependencies.

pub mod jwt;
pub mod password;
pub mod token;
