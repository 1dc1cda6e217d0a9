/// Workflow service
///
/// Runs every state change inside one store transaction: load (with row
/// locks), decide with the release engine, persist, commit. A rejection or
/// an error drops the transaction, which rolls it back, so a completion and
/// the release it triggers are stored together or not at all.
///
/// # Logging
///
/// Successful changes and policy rejections are logged at `info`, missing
/// records at `warn`. Storage failures are returned to the caller, which
/// decides how to report them.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::engine;
use super::identity::Identity;
use super::outcome::{CompletionOutcome, Rejection, WorkflowError, WorkflowResult};
use super::sequencing;
use crate::models::scenario::{self, CreateScenario, Scenario};
use crate::models::task::{self, CreateTask, Task};
use crate::store::{EntityStore, StoreTransaction};

/// Input for a new task
pub type NewTask = CreateTask;

/// A scenario together with its tasks in sequence order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioBoard {
    pub scenario: Scenario,
    pub tasks: Vec<Task>,
}

/// Entry point for every task and scenario operation
#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<dyn EntityStore>,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService").finish_non_exhaustive()
    }
}

async fn load_task(tx: &mut dyn StoreTransaction, task_id: i64) -> WorkflowResult<Task> {
    match tx.get_task(task_id).await? {
        Some(task) => Ok(task),
        None => {
            warn!(task_id, "Task not found");
            Err(WorkflowError::TaskNotFound(task_id))
        }
    }
}

fn scenario_not_found(scenario_id: i64) -> WorkflowError {
    warn!(scenario_id, "Scenario not found");
    WorkflowError::ScenarioNotFound(scenario_id)
}

fn check_new_task(new: &NewTask) -> WorkflowResult<()> {
    let description = new.description.trim();
    if description.is_empty() || description.chars().count() > task::MAX_DESCRIPTION_LEN {
        return Err(WorkflowError::InvalidInput(format!(
            "description must be 1 to {} characters",
            task::MAX_DESCRIPTION_LEN
        )));
    }

    let owner = new.owner.trim();
    if owner.is_empty() || owner.chars().count() > task::MAX_OWNER_LEN {
        return Err(WorkflowError::InvalidInput(format!(
            "owner must be 1 to {} characters",
            task::MAX_OWNER_LEN
        )));
    }

    Ok(())
}

impl WorkflowService {
    /// Creates a service over `store`
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Completes a task on behalf of `actor`
    ///
    /// On success the task is completed and, if its successor was locked,
    /// the successor is released in the same transaction.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::TaskNotFound` if the task does not exist
    /// - `WorkflowError::Rejected` with `NotOwner`, `NotReleased` or
    ///   `AlreadyCompleted`; nothing is written
    /// - `WorkflowError::Storage` if the store fails
    pub async fn complete_task<I>(&self, task_id: i64, actor: &I) -> WorkflowResult<CompletionOutcome>
    where
        I: Identity + ?Sized,
    {
        let mut tx = self.store.begin().await?;
        let task = load_task(tx.as_mut(), task_id).await?;
        let siblings = tx.get_scenario_tasks(task.scenario_id).await?;

        let completion = match engine::evaluate_completion(&task, &siblings, actor, Utc::now()) {
            Ok(completion) => completion,
            Err(rejection) => {
                info!(
                    task_id,
                    username = %actor.username(),
                    reason = rejection.code(),
                    "Task completion rejected"
                );
                return Err(rejection.into());
            }
        };

        tx.save_task(&completion.completed).await?;

        // The successor was read without a lock; re-read it locked and only
        // release it if it is still locked.
        let mut newly_released = None;
        if let Some(next) = completion.newly_released {
            let still_locked = tx
                .get_task(next.id)
                .await?
                .is_some_and(|current| !current.is_released());
            if still_locked {
                tx.save_task(&next).await?;
                newly_released = Some(next);
            }
        }

        tx.commit().await?;

        info!(
            task_id,
            username = %actor.username(),
            released_task_id = ?newly_released.as_ref().map(|t| t.id),
            "Task completed"
        );

        Ok(CompletionOutcome {
            completed_task: completion.completed,
            newly_released,
        })
    }

    /// Adds a task to a scenario (or to the ungrouped set)
    ///
    /// If the group has no released task afterwards, its first task in
    /// sequence order is released. The returned task reflects that.
    pub async fn create_task(&self, new: NewTask) -> WorkflowResult<Task> {
        check_new_task(&new)?;

        let mut tx = self.store.begin().await?;
        let scenario_id = new.scenario_id;
        if !tx.lock_group(scenario_id).await? {
            return Err(scenario_not_found(scenario_id.unwrap_or_default()));
        }

        let mut created = tx
            .insert_task(CreateTask {
                description: new.description.trim().to_string(),
                owner: new.owner.trim().to_string(),
                ..new
            })
            .await?;

        let siblings = tx.get_scenario_tasks(scenario_id).await?;
        if let Some(first) = engine::evaluate_bootstrap_release(&siblings, Utc::now()) {
            tx.save_task(&first).await?;
            info!(task_id = first.id, scenario_id = ?scenario_id, "Task released (bootstrap)");
            if first.id == created.id {
                created = first;
            }
        }

        tx.commit().await?;

        info!(
            task_id = created.id,
            scenario_id = ?scenario_id,
            owner = %created.owner,
            sequence_number = created.sequence_number,
            "Task created"
        );
        Ok(created)
    }

    /// Deletes a task that has not been completed; siblings keep their
    /// release state
    ///
    /// # Errors
    ///
    /// - `WorkflowError::TaskNotFound` if the task does not exist
    /// - `WorkflowError::Rejected(AlreadyCompleted)` if the task is completed;
    ///   nothing is deleted
    pub async fn delete_task(&self, task_id: i64) -> WorkflowResult<()> {
        let mut tx = self.store.begin().await?;
        let task = load_task(tx.as_mut(), task_id).await?;
        if task.is_completed() {
            let rejection = Rejection::AlreadyCompleted;
            info!(task_id, reason = rejection.code(), "Task deletion rejected");
            return Err(rejection.into());
        }
        tx.delete_task(task_id).await?;
        tx.commit().await?;

        info!(task_id, "Task deleted");
        Ok(())
    }

    /// Deletes a scenario and all of its tasks
    pub async fn delete_scenario(&self, scenario_id: i64) -> WorkflowResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.lock_group(Some(scenario_id)).await? {
            return Err(scenario_not_found(scenario_id));
        }
        tx.delete_scenario(scenario_id).await?;
        tx.commit().await?;

        info!(scenario_id, "Scenario deleted");
        Ok(())
    }

    /// Manually releases a locked task, whatever the state of its predecessor
    pub async fn release_task(&self, task_id: i64) -> WorkflowResult<Task> {
        let mut tx = self.store.begin().await?;
        let task = load_task(tx.as_mut(), task_id).await?;

        let released = match sequencing::release(&task, Utc::now()) {
            Ok(released) => released,
            Err(rejection) => {
                info!(task_id, reason = rejection.code(), "Manual release rejected");
                return Err(rejection.into());
            }
        };

        tx.save_task(&released).await?;
        tx.commit().await?;

        info!(task_id, "Task released (manual)");
        Ok(released)
    }

    /// Creates an empty scenario
    pub async fn create_scenario(
        &self,
        name: &str,
        created_by: Option<Uuid>,
    ) -> WorkflowResult<Scenario> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > scenario::MAX_NAME_LEN {
            return Err(WorkflowError::InvalidInput(format!(
                "name must be 1 to {} characters",
                scenario::MAX_NAME_LEN
            )));
        }

        let mut tx = self.store.begin().await?;
        let created = tx
            .insert_scenario(CreateScenario {
                name: name.to_string(),
                created_by,
            })
            .await?;
        tx.commit().await?;

        info!(scenario_id = created.id, name = %created.name, "Scenario created");
        Ok(created)
    }

    /// Loads one task
    pub async fn get_task(&self, task_id: i64) -> WorkflowResult<Task> {
        let mut tx = self.store.begin().await?;
        match tx.find_task(task_id).await? {
            Some(task) => Ok(task),
            None => {
                warn!(task_id, "Task not found");
                Err(WorkflowError::TaskNotFound(task_id))
            }
        }
    }

    /// All scenarios, oldest first
    pub async fn list_scenarios(&self) -> WorkflowResult<Vec<Scenario>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_scenarios().await?)
    }

    /// A scenario with its tasks in sequence order
    pub async fn scenario_board(&self, scenario_id: i64) -> WorkflowResult<ScenarioBoard> {
        let mut tx = self.store.begin().await?;
        let scenario = tx
            .get_scenario(scenario_id)
            .await?
            .ok_or_else(|| scenario_not_found(scenario_id))?;
        let tasks = tx.get_scenario_tasks(Some(scenario_id)).await?;

        Ok(ScenarioBoard { scenario, tasks })
    }

    /// Tasks that belong to no scenario, in sequence order
    pub async fn list_ungrouped_tasks(&self) -> WorkflowResult<Vec<Task>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.get_scenario_tasks(None).await?)
    }
}
