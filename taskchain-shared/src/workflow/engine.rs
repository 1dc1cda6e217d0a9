/// Release engine
///
/// Pure decisions over a task and its scenario siblings. Nothing here reads
/// a clock or touches storage; the caller supplies `now` and persists
/// whatever comes back.
///
/// # Completion
///
/// Checks run in a fixed order and the first failing check wins:
///
/// 1. the actor owns the task, else [`Rejection::NotOwner`]
/// 2. the task is released, else [`Rejection::NotReleased`]
/// 3. the task is not completed yet, else [`Rejection::AlreadyCompleted`]
///
/// A successful completion stamps `completed_at` and, if the task's
/// successor is still locked, stamps the successor's `released_at` with the
/// same instant. At most these two records change.

use chrono::{DateTime, Utc};

use super::identity::Identity;
use super::outcome::Rejection;
use super::sequencing;
use crate::models::task::Task;

/// Records to persist after a successful completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The task with `completed_at` set
    pub completed: Task,

    /// The successor with `released_at` set, when this completion unlocked it
    pub newly_released: Option<Task>,
}

/// Decides whether `actor` may complete `task` and what that changes
pub fn evaluate_completion<I>(
    task: &Task,
    siblings: &[Task],
    actor: &I,
    now: DateTime<Utc>,
) -> Result<Completion, Rejection>
where
    I: Identity + ?Sized,
{
    if !task.is_owned_by(actor.username()) {
        return Err(Rejection::NotOwner);
    }
    if !task.is_released() {
        return Err(Rejection::NotReleased);
    }
    if task.is_completed() {
        return Err(Rejection::AlreadyCompleted);
    }

    let completed = Task {
        completed_at: Some(now),
        ..task.clone()
    };

    let newly_released = sequencing::successor_of(task, siblings)
        .filter(|next| !next.is_released())
        .map(|next| Task {
            released_at: Some(now),
            ..next.clone()
        });

    Ok(Completion {
        completed,
        newly_released,
    })
}

/// Releases the first task of a scenario that has nothing released yet
///
/// Returns the task to persist, or `None` when some task of the scenario is
/// already released (or the scenario is empty).
pub fn evaluate_bootstrap_release(siblings: &[Task], now: DateTime<Utc>) -> Option<Task> {
    if sequencing::has_released(siblings) {
        return None;
    }

    sequencing::bootstrap_candidate(siblings).map(|first| Task {
        released_at: Some(now),
        ..first.clone()
    })
}
