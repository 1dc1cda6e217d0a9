/// PostgreSQL entity store
///
/// Each transaction is a `sqlx::Transaction` at the server's default
/// isolation (READ COMMITTED). Row locks come from `SELECT ... FOR UPDATE`;
/// the ungrouped task set, which has no row to lock, uses a
/// transaction-scoped advisory lock.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{EntityStore, StoreResult, StoreTransaction};
use crate::models::scenario::{CreateScenario, Scenario};
use crate::models::task::{CreateTask, Task};

/// Advisory lock key guarding inserts of ungrouped tasks
const UNGROUPED_LOCK_KEY: i64 = 0x7461_736b_6368_6e00;

/// Entity store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn get_task(&mut self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::lock_by_id(&mut *self.tx, id).await?)
    }

    async fn find_task(&mut self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&mut *self.tx, id).await?)
    }

    async fn get_scenario(&mut self, id: i64) -> StoreResult<Option<Scenario>> {
        Ok(Scenario::find_by_id(&mut *self.tx, id).await?)
    }

    async fn lock_group(&mut self, scenario_id: Option<i64>) -> StoreResult<bool> {
        match scenario_id {
            Some(id) => Ok(Scenario::lock_by_id(&mut *self.tx, id).await?.is_some()),
            None => {
                sqlx::query("SELECT pg_advisory_xact_lock($1)")
                    .bind(UNGROUPED_LOCK_KEY)
                    .execute(&mut *self.tx)
                    .await?;
                debug!("Acquired ungrouped task lock");
                Ok(true)
            }
        }
    }

    async fn get_scenario_tasks(&mut self, scenario_id: Option<i64>) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_scenario(&mut *self.tx, scenario_id).await?)
    }

    async fn insert_task(&mut self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&mut *self.tx, data).await?)
    }

    async fn save_task(&mut self, task: &Task) -> StoreResult<bool> {
        Ok(Task::save(&mut *self.tx, task).await?)
    }

    async fn delete_task(&mut self, id: i64) -> StoreResult<bool> {
        Ok(Task::delete(&mut *self.tx, id).await?)
    }

    async fn insert_scenario(&mut self, data: CreateScenario) -> StoreResult<Scenario> {
        Ok(Scenario::create(&mut *self.tx, data).await?)
    }

    async fn delete_scenario(&mut self, id: i64) -> StoreResult<bool> {
        Ok(Scenario::delete(&mut *self.tx, id).await?)
    }

    async fn list_scenarios(&mut self) -> StoreResult<Vec<Scenario>> {
        Ok(Scenario::list(&mut *self.tx).await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
