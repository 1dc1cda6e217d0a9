/// Scenario model and database operations
///
/// A scenario (project) is a named container of an ordered task list. Tasks
/// point at their scenario by ID; the scenario holds no back-references, its
/// tasks are always fetched with a query.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE scenarios (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a scenario deletes its tasks (`ON DELETE CASCADE` on `tasks.scenario_id`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Maximum length of a scenario name
pub const MAX_NAME_LEN: usize = 200;

/// Scenario model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Scenario {
    /// Unique scenario ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// User who created the scenario (nullable if user deleted)
    pub created_by: Option<Uuid>,

    /// When the scenario was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScenario {
    /// Scenario name
    pub name: String,

    /// Creating user
    pub created_by: Option<Uuid>,
}

impl Scenario {
    /// Creates a new, empty scenario
    pub async fn create<'e, E>(executor: E, data: CreateScenario) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let scenario = sqlx::query_as::<_, Scenario>(
            r#"
            INSERT INTO scenarios (name, created_by)
            VALUES ($1, $2)
            RETURNING id, name, created_by, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(scenario)
    }

    /// Finds a scenario by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let scenario = sqlx::query_as::<_, Scenario>(
            "SELECT id, name, created_by, created_at FROM scenarios WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(scenario)
    }

    /// Finds a scenario by ID and locks its row until the enclosing transaction ends
    ///
    /// Task inserts take this lock so that two concurrent inserts into an
    /// empty scenario cannot both bootstrap-release a task.
    pub async fn lock_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let scenario = sqlx::query_as::<_, Scenario>(
            "SELECT id, name, created_by, created_at FROM scenarios WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(scenario)
    }

    /// Lists all scenarios, oldest first
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let scenarios = sqlx::query_as::<_, Scenario>(
            "SELECT id, name, created_by, created_at FROM scenarios ORDER BY id ASC",
        )
        .fetch_all(executor)
        .await?;

        Ok(scenarios)
    }

    /// Deletes a scenario together with all of its tasks
    ///
    /// Member tasks are removed before the scenario row; no task outlives
    /// its scenario. The member rows are locked in sequence order first,
    /// the same order completions lock a task and its successor in, so a
    /// concurrent completion waits instead of deadlocking.
    pub async fn delete(conn: &mut sqlx::PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query(
            r#"
            SELECT id FROM tasks
            WHERE scenario_id = $1
            ORDER BY sequence_number ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE scenario_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM scenarios WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
