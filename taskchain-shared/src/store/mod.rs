/// Transactional entity store
///
/// The workflow service reaches users' scenarios and tasks only through the
/// [`EntityStore`] trait, so the release rules run unchanged against
/// PostgreSQL ([`PgStore`]) and against process memory ([`MemoryStore`]).
///
/// # Transactions
///
/// Every workflow operation runs inside one [`StoreTransaction`]:
///
/// ```text
/// store.begin() ──> get_task (row lock) ──> ... ──> save_task ──> commit()
///                        │
///                        └── dropped without commit() ──> rolled back
/// ```
///
/// `get_task` locks the task until the transaction ends (`find_task` is its
/// non-locking twin for reads) and `lock_group`
/// locks a scenario (or the ungrouped set), so two transactions touching the
/// same task or inserting into the same scenario run one after the other.
///
/// # Example
///
/// ```
/// use taskchain_shared::store::{EntityStore, MemoryStore};
/// use taskchain_shared::models::scenario::CreateScenario;
///
/// # async fn example() -> Result<(), taskchain_shared::store::StoreError> {
/// let store = MemoryStore::new();
///
/// let mut tx = store.begin().await?;
/// let scenario = tx
///     .insert_scenario(CreateScenario { name: "Release".to_string(), created_by: None })
///     .await?;
/// tx.commit().await?;
///
/// let mut tx = store.begin().await?;
/// assert!(tx.get_scenario(scenario.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::models::scenario::{CreateScenario, Scenario};
use crate::models::task::{CreateTask, Task};

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected or failed the operation
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write would break referential integrity
    #[error("Integrity violation: {0}")]
    Integrity(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Source of transactions
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Opens a new transaction
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// Record access inside one atomic unit of work
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// all of its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Loads a task and locks it until the transaction ends
    async fn get_task(&mut self, id: i64) -> StoreResult<Option<Task>>;

    /// Loads a task without locking it, for read-only paths
    async fn find_task(&mut self, id: i64) -> StoreResult<Option<Task>>;

    /// Loads a scenario without locking it
    async fn get_scenario(&mut self, id: i64) -> StoreResult<Option<Scenario>>;

    /// Serializes writers of one sequencing group until the transaction ends
    ///
    /// `Some(id)` locks that scenario and returns false if it does not exist.
    /// `None` locks the group of ungrouped tasks and always returns true.
    async fn lock_group(&mut self, scenario_id: Option<i64>) -> StoreResult<bool>;

    /// Tasks of a scenario (`None`: ungrouped tasks) ordered by `(sequence_number, id)`
    async fn get_scenario_tasks(&mut self, scenario_id: Option<i64>) -> StoreResult<Vec<Task>>;

    /// Inserts a locked task and returns it with its assigned id
    async fn insert_task(&mut self, data: CreateTask) -> StoreResult<Task>;

    /// Writes back a task's mutable fields; false if it no longer exists
    async fn save_task(&mut self, task: &Task) -> StoreResult<bool>;

    /// Deletes a task; false if it did not exist
    async fn delete_task(&mut self, id: i64) -> StoreResult<bool>;

    /// Inserts a scenario and returns it with its assigned id
    async fn insert_scenario(&mut self, data: CreateScenario) -> StoreResult<Scenario>;

    /// Deletes a scenario and all of its tasks; false if it did not exist
    async fn delete_scenario(&mut self, id: i64) -> StoreResult<bool>;

    /// All scenarios, oldest first
    async fn list_scenarios(&mut self) -> StoreResult<Vec<Scenario>>;

    /// Makes every write of this transaction durable
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
