/// Middleware modules for the API server
///
/// - `auth`: bearer token authentication and the request's acting identity
/// - `security`: security response headers

pub mod auth;
pub mod security;
