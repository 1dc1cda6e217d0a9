/// Rejections, errors and outcomes of workflow operations
///
/// A [`Rejection`] is an expected answer ("not yours", "not yet") and leaves
/// every record untouched. A [`WorkflowError`] wraps rejections together
/// with missing records and storage failures.

use serde::Serialize;

use crate::models::task::Task;
use crate::store::StoreError;

/// Policy refusal of a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The actor is not the task's owner
    #[error("only the task owner may complete it")]
    NotOwner,

    /// The task has not been released yet
    #[error("task has not been released yet")]
    NotReleased,

    /// The task was completed before
    #[error("task is already completed")]
    AlreadyCompleted,

    /// Manual release of a task that is already released
    #[error("task is already released")]
    AlreadyReleased,
}

impl Rejection {
    /// Machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::NotOwner => "not_owner",
            Rejection::NotReleased => "not_released",
            Rejection::AlreadyCompleted => "already_completed",
            Rejection::AlreadyReleased => "already_released",
        }
    }
}

/// Workflow error types
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Refused by the sequencing rules
    #[error("{0}")]
    Rejected(#[from] Rejection),

    /// No task with this id
    #[error("Task {0} not found")]
    TaskNotFound(i64),

    /// No scenario with this id
    #[error("Scenario {0} not found")]
    ScenarioNotFound(i64),

    /// Input that can never be stored (empty or over-long fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store failed; the operation's transaction was rolled back
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::Storage(StoreError::Database(err))
    }
}

impl WorkflowError {
    /// The rejection, if this error is one
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            WorkflowError::Rejected(r) => Some(*r),
            _ => None,
        }
    }
}

/// Workflow result type alias
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result of a successful completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionOutcome {
    /// The task, now completed
    pub completed_task: Task,

    /// Successor released by this completion, if any
    pub newly_released: Option<Task>,
}

impl CompletionOutcome {
    /// Classifies the outcome
    pub fn kind(&self) -> OutcomeKind {
        match &self.newly_released {
            Some(next) => OutcomeKind::NewlyReleasedSuccessor(next.id),
            None => OutcomeKind::Completed,
        }
    }
}

/// Flat classification of any completion or release attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Completed; nothing was released
    Completed,

    /// Completed, and the task with this id was released
    NewlyReleasedSuccessor(i64),

    NotOwner,
    NotReleased,
    AlreadyCompleted,
    AlreadyReleased,
}

impl OutcomeKind {
    /// Snake-case name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Completed => "completed",
            OutcomeKind::NewlyReleasedSuccessor(_) => "newly_released_successor",
            OutcomeKind::NotOwner => "not_owner",
            OutcomeKind::NotReleased => "not_released",
            OutcomeKind::AlreadyCompleted => "already_completed",
            OutcomeKind::AlreadyReleased => "already_released",
        }
    }

    /// Whether the attempt changed state
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Completed | OutcomeKind::NewlyReleasedSuccessor(_)
        )
    }
}

impl From<Rejection> for OutcomeKind {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::NotOwner => OutcomeKind::NotOwner,
            Rejection::NotReleased => OutcomeKind::NotReleased,
            Rejection::AlreadyCompleted => OutcomeKind::AlreadyCompleted,
            Rejection::AlreadyReleased => OutcomeKind::AlreadyReleased,
        }
    }
}

impl From<&CompletionOutcome> for OutcomeKind {
    fn from(outcome: &CompletionOutcome) -> Self {
        outcome.kind()
    }
}
