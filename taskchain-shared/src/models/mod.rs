/// Database models for TaskChain
///
/// This module contains the database models and their queries.
///
/// # Models
///
/// - `user`: User accounts and authentication
/// - `scenario`: Named containers of an ordered task list
/// - `task`: Sequenced tasks with owner and release/completion timestamps
///
/// Task queries are generic over `sqlx::PgExecutor` so they run equally on
/// a pool or inside a transaction.
///
/// # Example
///
/// ```no_run
/// use taskchain_shared::models::scenario::{Scenario, CreateScenario};
/// use taskchain_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let scenario = Scenario::create(&pool, CreateScenario {
///     name: "Release 1.0".to_string(),
///     created_by: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod scenario;
pub mod task;
pub mod user;
