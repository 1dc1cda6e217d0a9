/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Accounts and tokens
/// - `scenarios`: Scenario management and scenario tasks
/// - `tasks`: Task lifecycle (complete, release, delete)

pub mod auth;
pub mod health;
pub mod scenarios;
pub mod tasks;
