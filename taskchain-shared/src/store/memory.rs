/// In-memory entity store
///
/// Holds all records behind one `tokio::sync::Mutex`. A transaction owns the
/// lock from `begin` until it is committed or dropped and works on a private
/// copy of the state, so transactions are fully serialized and an abandoned
/// transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{EntityStore, StoreError, StoreResult, StoreTransaction};
use crate::models::scenario::{CreateScenario, Scenario};
use crate::models::task::{CreateTask, Task};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    scenarios: BTreeMap<i64, Scenario>,
    tasks: BTreeMap<i64, Task>,
    last_scenario_id: i64,
    last_task_id: i64,
}

/// Entity store kept in process memory
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get_task(&mut self, id: i64) -> StoreResult<Option<Task>> {
        Ok(self.working.tasks.get(&id).cloned())
    }

    async fn find_task(&mut self, id: i64) -> StoreResult<Option<Task>> {
        self.get_task(id).await
    }

    async fn get_scenario(&mut self, id: i64) -> StoreResult<Option<Scenario>> {
        Ok(self.working.scenarios.get(&id).cloned())
    }

    async fn lock_group(&mut self, scenario_id: Option<i64>) -> StoreResult<bool> {
        // The whole store is already held by this transaction.
        Ok(scenario_id.map_or(true, |id| self.working.scenarios.contains_key(&id)))
    }

    async fn get_scenario_tasks(&mut self, scenario_id: Option<i64>) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .working
            .tasks
            .values()
            .filter(|t| t.scenario_id == scenario_id)
            .cloned()
            .collect();
        tasks.sort_by_key(Task::sequence_key);
        Ok(tasks)
    }

    async fn insert_task(&mut self, data: CreateTask) -> StoreResult<Task> {
        if let Some(scenario_id) = data.scenario_id {
            if !self.working.scenarios.contains_key(&scenario_id) {
                return Err(StoreError::Integrity(format!(
                    "scenario {scenario_id} does not exist"
                )));
            }
        }

        self.working.last_task_id += 1;
        let task = Task {
            id: self.working.last_task_id,
            scenario_id: data.scenario_id,
            sequence_number: data.sequence_number,
            description: data.description,
            owner: data.owner,
            released_at: None,
            completed_at: None,
            created_at: Utc::now(),
        };
        self.working.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn save_task(&mut self, task: &Task) -> StoreResult<bool> {
        let Some(stored) = self.working.tasks.get_mut(&task.id) else {
            return Ok(false);
        };

        if stored.completed_at.is_some() && stored.completed_at != task.completed_at {
            return Err(StoreError::Integrity(format!(
                "completed_at of task {} cannot change once set",
                task.id
            )));
        }
        if task.completed_at.is_some() && task.released_at.is_none() {
            return Err(StoreError::Integrity(format!(
                "task {} cannot be completed before it is released",
                task.id
            )));
        }

        stored.sequence_number = task.sequence_number;
        stored.description = task.description.clone();
        stored.owner = task.owner.clone();
        stored.released_at = task.released_at;
        stored.completed_at = task.completed_at;
        Ok(true)
    }

    async fn delete_task(&mut self, id: i64) -> StoreResult<bool> {
        Ok(self.working.tasks.remove(&id).is_some())
    }

    async fn insert_scenario(&mut self, data: CreateScenario) -> StoreResult<Scenario> {
        self.working.last_scenario_id += 1;
        let scenario = Scenario {
            id: self.working.last_scenario_id,
            name: data.name,
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        self.working.scenarios.insert(scenario.id, scenario.clone());
        Ok(scenario)
    }

    async fn delete_scenario(&mut self, id: i64) -> StoreResult<bool> {
        self.working.tasks.retain(|_, t| t.scenario_id != Some(id));
        Ok(self.working.scenarios.remove(&id).is_some())
    }

    async fn list_scenarios(&mut self) -> StoreResult<Vec<Scenario>> {
        Ok(self.working.scenarios.values().cloned().collect())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
