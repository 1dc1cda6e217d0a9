/// Ordering rules inside a scenario
///
/// Tasks are ordered by `(sequence_number, id)`. Sequence numbers need not be
/// unique; among equal numbers the older task (lower id) comes first.
///
/// The successor of a task is the first task whose sequence number is
/// strictly greater, so tasks sharing a number are parallel steps: none of
/// them releases another.
///
/// ```text
///  seq:   1      2      2      5
///  id:   10     11     14     12
///         A ───> B            (A's successor is B, the lower id at seq 2)
///                B ─────────> D (B's successor is D; C at seq 2 is a peer)
/// ```

use chrono::{DateTime, Utc};

use super::outcome::Rejection;
use crate::models::task::Task;

/// Sorts tasks into sequence order in place
pub fn sort_in_sequence(tasks: &mut [Task]) {
    tasks.sort_by_key(Task::sequence_key);
}

/// The task that follows `task` in its scenario
///
/// Smallest sequence number strictly greater than `task`'s, lowest id on ties.
pub fn successor_of<'a>(task: &Task, siblings: &'a [Task]) -> Option<&'a Task> {
    siblings
        .iter()
        .filter(|t| t.id != task.id && t.sequence_number > task.sequence_number)
        .min_by_key(|t| t.sequence_key())
}

/// The task that precedes `task` in its scenario
///
/// Largest sequence number strictly smaller than `task`'s, lowest id on ties.
pub fn predecessor_of<'a>(task: &Task, siblings: &'a [Task]) -> Option<&'a Task> {
    siblings
        .iter()
        .filter(|t| t.id != task.id && t.sequence_number < task.sequence_number)
        .min_by_key(|t| (std::cmp::Reverse(t.sequence_number), t.id))
}

/// First task in sequence order; the one a fresh scenario releases
pub fn bootstrap_candidate(siblings: &[Task]) -> Option<&Task> {
    siblings.iter().min_by_key(|t| t.sequence_key())
}

/// Whether any task of the scenario has been released
pub fn has_released(siblings: &[Task]) -> bool {
    siblings.iter().any(Task::is_released)
}

/// Manual release: unlocks `task` regardless of its predecessor
///
/// # Errors
///
/// `Rejection::AlreadyReleased` if the task was released before (this
/// includes completed tasks).
pub fn release(task: &Task, now: DateTime<Utc>) -> Result<Task, Rejection> {
    if task.is_released() {
        return Err(Rejection::AlreadyReleased);
    }

    Ok(Task {
        released_at: Some(now),
        ..task.clone()
    })
}
