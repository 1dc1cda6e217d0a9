/// Task sequencing workflow
///
/// The rules that decide when a task may be completed, who may complete it,
/// and which task is released next.
///
/// # Modules
///
/// - [`identity`]: the acting user as seen by the rules
/// - [`sequencing`]: ordering, successor/predecessor and manual release
/// - [`engine`]: pure completion and bootstrap-release decisions
/// - [`outcome`]: rejection codes and completion outcomes
/// - [`service`]: runs the decisions against an entity store, one
///   transaction per operation
///
/// `sequencing` and `engine` perform no I/O; every function takes the
/// current time as an argument.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskchain_shared::store::MemoryStore;
/// use taskchain_shared::workflow::{Actor, NewTask, WorkflowService};
///
/// # async fn example() -> Result<(), taskchain_shared::workflow::WorkflowError> {
/// let service = WorkflowService::new(Arc::new(MemoryStore::new()));
/// let scenario = service.create_scenario("Release 1.0", None).await?;
///
/// let design = service
///     .create_task(NewTask {
///         scenario_id: Some(scenario.id),
///         sequence_number: 1,
///         description: "Design".to_string(),
///         owner: "alice".to_string(),
///     })
///     .await?;
/// assert!(design.is_released());
///
/// let outcome = service.complete_task(design.id, &Actor::new("alice")).await?;
/// assert!(outcome.completed_task.is_completed());
/// # Ok(())
/// # }
/// ```

pub mod engine;
pub mod identity;
pub mod outcome;
pub mod sequencing;
pub mod service;

pub use identity::{Actor, Identity};
pub use outcome::{CompletionOutcome, OutcomeKind, Rejection, WorkflowError, WorkflowResult};
pub use service::{NewTask, ScenarioBoard, WorkflowService};
