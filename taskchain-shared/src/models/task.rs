/// Task model and database operations
///
/// A task ("atividade") is a unit of work inside a scenario. It has a single
/// owner, a position in the scenario's sequence, and two lifecycle timestamps.
///
/// # State Machine
///
/// ```text
/// locked ──(bootstrap | cascade | manual release)──> released ──(owner completes)──> completed
///   │                                                   │
///   └──────────────────────(delete)─────────────────────┴──> removed
/// ```
///
/// The state is derived from the timestamps: `released_at` unset means locked,
/// `completed_at` set means completed. Completion is terminal.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     scenario_id BIGINT REFERENCES scenarios(id) ON DELETE CASCADE,
///     sequence_number INTEGER NOT NULL,
///     description VARCHAR(200) NOT NULL,
///     owner VARCHAR(100) NOT NULL,
///     released_at TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_completed_requires_release CHECK (
///         completed_at IS NULL OR released_at IS NOT NULL
///     )
/// );
/// ```
///
/// A `NULL` scenario marks a legacy ungrouped task; all ungrouped tasks are
/// sequenced together as one implicit group.
///
/// # Example
///
/// ```no_run
/// use taskchain_shared::models::task::{Task, CreateTask};
/// use taskchain_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     scenario_id: Some(1),
///     sequence_number: 1,
///     description: "Design".to_string(),
///     owner: "alice".to_string(),
/// }).await?;
///
/// let tasks = Task::list_by_scenario(&pool, task.scenario_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Maximum length of a task description
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Maximum length of an owner username
pub const MAX_OWNER_LEN: usize = 100;

/// Lifecycle status of a task, derived from its timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for its predecessor (or a manual release)
    Locked,

    /// Eligible for completion by its owner
    Released,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Converts status to its wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Locked => "locked",
            TaskStatus::Released => "released",
            TaskStatus::Completed => "completed",
        }
    }

    /// Checks if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Internal identifier, assigned in insertion order
    pub id: i64,

    /// Owning scenario (None for ungrouped tasks)
    pub scenario_id: Option<i64>,

    /// Position within the scenario; not required to be unique
    pub sequence_number: i32,

    /// What has to be done
    pub description: String,

    /// Username of the only user allowed to complete this task
    pub owner: String,

    /// When the task became eligible for completion (None = locked)
    pub released_at: Option<DateTime<Utc>>,

    /// When the task was completed (None = pending)
    pub completed_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Scenario to add the task to (None for ungrouped)
    pub scenario_id: Option<i64>,

    /// Position within the scenario
    pub sequence_number: i32,

    /// Task description
    pub description: String,

    /// Owner username
    pub owner: String,
}

impl Task {
    /// Derives the lifecycle status
    pub fn status(&self) -> TaskStatus {
        if self.completed_at.is_some() {
            TaskStatus::Completed
        } else if self.released_at.is_some() {
            TaskStatus::Released
        } else {
            TaskStatus::Locked
        }
    }

    /// Whether the task may be completed by its owner
    pub fn is_released(&self) -> bool {
        self.released_at.is_some()
    }

    /// Whether the task has been completed
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Whether `username` is the owner of this task
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner == username
    }

    /// Sort key used for sequencing: sequence number, then insertion order
    pub fn sequence_key(&self) -> (i32, i64) {
        (self.sequence_number, self.id)
    }

    /// Inserts a new, locked task
    ///
    /// Release state is not decided here; callers that need the bootstrap rule
    /// go through the workflow service.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario does not exist (foreign key violation)
    /// or the database operation fails
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (scenario_id, sequence_number, description, owner)
            VALUES ($1, $2, $3, $4)
            RETURNING id, scenario_id, sequence_number, description, owner,
                      released_at, completed_at, created_at
            "#,
        )
        .bind(data.scenario_id)
        .bind(data.sequence_number)
        .bind(data.description)
        .bind(data.owner)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, scenario_id, sequence_number, description, owner,
                   released_at, completed_at, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID and locks its row until the enclosing transaction ends
    ///
    /// Concurrent callers block on the lock, so the second of two concurrent
    /// completions sees the first one's committed `completed_at`.
    pub async fn lock_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, scenario_id, sequence_number, description, owner,
                   released_at, completed_at, created_at
            FROM tasks
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists the tasks of a scenario in sequence order
    ///
    /// `None` selects the ungrouped tasks. Ties on `sequence_number` are
    /// ordered by ID.
    pub async fn list_by_scenario<'e, E>(
        executor: E,
        scenario_id: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, scenario_id, sequence_number, description, owner,
                   released_at, completed_at, created_at
            FROM tasks
            WHERE scenario_id IS NOT DISTINCT FROM $1
            ORDER BY sequence_number ASC, id ASC
            "#,
        )
        .bind(scenario_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Writes the mutable fields of a task back to the database
    ///
    /// Returns false if the task no longer exists.
    pub async fn save<'e, E>(executor: E, task: &Task) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET sequence_number = $2,
                description = $3,
                owner = $4,
                released_at = $5,
                completed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(task.sequence_number)
        .bind(&task.description)
        .bind(&task.owner)
        .bind(task.released_at)
        .bind(task.completed_at)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a task
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
