/// Workflow behaviour tests
///
/// Exercise the workflow service end to end on the in-memory store; no
/// database is needed.
///
/// Run with: cargo test -p taskchain-shared --test workflow_tests

use std::sync::Arc;

use taskchain_shared::models::task::{Task, TaskStatus};
use taskchain_shared::store::MemoryStore;
use taskchain_shared::workflow::{
    Actor, NewTask, OutcomeKind, Rejection, WorkflowError, WorkflowService,
};

fn service() -> WorkflowService {
    WorkflowService::new(Arc::new(MemoryStore::new()))
}

fn task_in(scenario_id: i64, sequence_number: i32, description: &str, owner: &str) -> NewTask {
    NewTask {
        scenario_id: Some(scenario_id),
        sequence_number,
        description: description.to_string(),
        owner: owner.to_string(),
    }
}

/// Creates a scenario holding one task per `(sequence_number, owner)`
async fn scenario_with(svc: &WorkflowService, steps: &[(i32, &str)]) -> (i64, Vec<Task>) {
    let scenario = svc.create_scenario("Sprint", None).await.unwrap();
    let mut tasks = Vec::new();
    for (seq, owner) in steps {
        let t = svc
            .create_task(task_in(scenario.id, *seq, &format!("step {seq}"), owner))
            .await
            .unwrap();
        tasks.push(t);
    }
    (scenario.id, tasks)
}

fn rejection_of<T: std::fmt::Debug>(result: Result<T, WorkflowError>) -> Rejection {
    result
        .unwrap_err()
        .rejection()
        .expect("expected a policy rejection")
}

#[tokio::test]
async fn test_locked_task_cannot_be_completed() {
    let svc = service();
    let (_, tasks) = scenario_with(&svc, &[(1, "alice"), (2, "bob")]).await;
    let locked = &tasks[1];

    let result = svc.complete_task(locked.id, &Actor::new("bob")).await;
    assert_eq!(rejection_of(result), Rejection::NotReleased);

    let after = svc.get_task(locked.id).await.unwrap();
    assert_eq!(&after, locked, "rejected completion changes nothing");
}

#[tokio::test]
async fn test_only_owner_can_complete() {
    let svc = service();
    let (_, tasks) = scenario_with(&svc, &[(1, "alice")]).await;
    let first = &tasks[0];
    assert_eq!(first.status(), TaskStatus::Released);

    let result = svc.complete_task(first.id, &Actor::new("bob")).await;
    assert_eq!(rejection_of(result), Rejection::NotOwner);
    assert_eq!(svc.get_task(first.id).await.unwrap().completed_at, None);
}

#[tokio::test]
async fn test_completion_is_idempotent() {
    let svc = service();
    let (_, tasks) = scenario_with(&svc, &[(1, "alice")]).await;
    let alice = Actor::new("alice");

    let first = svc.complete_task(tasks[0].id, &alice).await.unwrap();
    let completed_at = first.completed_task.completed_at;
    assert!(completed_at.is_some());

    let second = svc.complete_task(tasks[0].id, &alice).await;
    assert_eq!(rejection_of(second), Rejection::AlreadyCompleted);
    assert_eq!(
        svc.get_task(tasks[0].id).await.unwrap().completed_at,
        completed_at,
        "completion time is not overwritten"
    );
}

#[tokio::test]
async fn test_completion_releases_only_the_next_task() {
    let svc = service();
    let (_, tasks) = scenario_with(&svc, &[(1, "alice"), (2, "bob"), (3, "carlos")]).await;
    let (t1, t2, t3) = (&tasks[0], &tasks[1], &tasks[2]);

    assert!(t1.is_released());
    assert!(!t2.is_released());
    assert!(!t3.is_released());

    let outcome = svc.complete_task(t1.id, &Actor::new("alice")).await.unwrap();
    assert_eq!(outcome.kind(), OutcomeKind::NewlyReleasedSuccessor(t2.id));

    let t2_now = svc.get_task(t2.id).await.unwrap();
    let t3_now = svc.get_task(t3.id).await.unwrap();
    assert_eq!(t2_now.status(), TaskStatus::Released);
    assert_eq!(t3_now.status(), TaskStatus::Locked);
    assert_eq!(t2_now.released_at, outcome.completed_task.completed_at);

    let early = svc.complete_task(t3.id, &Actor::new("carlos")).await;
    assert_eq!(rejection_of(early), Rejection::NotReleased);

    svc.complete_task(t2.id, &Actor::new("bob")).await.unwrap();
    let last = svc.complete_task(t3.id, &Actor::new("carlos")).await.unwrap();
    assert_eq!(last.kind(), OutcomeKind::Completed);
    assert!(last.newly_released.is_none());
}

#[tokio::test]
async fn test_first_task_bootstraps_once() {
    let svc = service();
    let scenario = svc.create_scenario("Empty", None).await.unwrap();

    let first = svc
        .create_task(task_in(scenario.id, 1, "first", "alice"))
        .await
        .unwrap();
    assert!(first.is_released());

    let second = svc
        .create_task(task_in(scenario.id, 2, "second", "bob"))
        .await
        .unwrap();
    assert!(!second.is_released());

    let board = svc.scenario_board(scenario.id).await.unwrap();
    let released: Vec<i64> = board
        .tasks
        .iter()
        .filter(|t| t.is_released())
        .map(|t| t.id)
        .collect();
    assert_eq!(released, vec![first.id]);
}

#[tokio::test]
async fn test_deleting_released_task_leaves_siblings_alone() {
    let svc = service();
    let (scenario_id, tasks) = scenario_with(&svc, &[(1, "alice"), (2, "bob")]).await;

    let before = svc.scenario_board(scenario_id).await.unwrap().tasks;
    svc.delete_task(tasks[0].id).await.unwrap();
    let after = svc.scenario_board(scenario_id).await.unwrap().tasks;

    assert_eq!(after, vec![before[1].clone()]);
    assert_eq!(after[0].status(), TaskStatus::Locked);

    assert!(matches!(
        svc.delete_task(tasks[0].id).await,
        Err(WorkflowError::TaskNotFound(_))
    ));
}

#[tokio::test]
async fn test_completed_task_cannot_be_deleted() {
    let svc = service();
    let (scenario_id, tasks) = scenario_with(&svc, &[(1, "alice"), (2, "bob")]).await;
    svc.complete_task(tasks[0].id, &Actor::new("alice")).await.unwrap();

    let result = svc.delete_task(tasks[0].id).await;
    assert_eq!(
        result.unwrap_err().rejection(),
        Some(Rejection::AlreadyCompleted)
    );

    let ids: Vec<i64> = svc
        .scenario_board(scenario_id)
        .await
        .unwrap()
        .tasks
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![tasks[0].id, tasks[1].id]);
}

#[tokio::test]
async fn test_design_then_build() {
    let svc = service();
    let scenario = svc.create_scenario("Website", None).await.unwrap();
    let design = svc
        .create_task(task_in(scenario.id, 1, "Design", "Alice"))
        .await
        .unwrap();
    let build = svc
        .create_task(task_in(scenario.id, 2, "Build", "Bob"))
        .await
        .unwrap();
    let (alice, bob) = (Actor::new("Alice"), Actor::new("Bob"));

    assert!(design.is_released());
    assert!(!build.is_released());

    assert_eq!(
        rejection_of(svc.complete_task(build.id, &bob).await),
        Rejection::NotReleased
    );
    assert_eq!(
        rejection_of(svc.complete_task(design.id, &bob).await),
        Rejection::NotOwner
    );

    let outcome = svc.complete_task(design.id, &alice).await.unwrap();
    assert_eq!(outcome.newly_released.as_ref().map(|t| t.id), Some(build.id));

    let done = svc.complete_task(build.id, &bob).await.unwrap();
    assert_eq!(done.completed_task.status(), TaskStatus::Completed);
}

#[tokio::test]
async fn test_concurrent_completion_has_one_winner() {
    let svc = Arc::new(service());
    let (_, tasks) = scenario_with(&svc, &[(1, "alice"), (2, "bob")]).await;
    let task_id = tasks[0].id;

    let attempts = (0..2).map(|_| {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.complete_task(task_id, &Actor::new("alice")).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let already: Vec<_> = results
        .iter()
        .filter_map(|r| r.as_ref().err().and_then(WorkflowError::rejection))
        .collect();

    assert_eq!(successes, 1);
    assert_eq!(already, vec![Rejection::AlreadyCompleted]);
    assert!(svc.get_task(tasks[1].id).await.unwrap().is_released());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_bootstrap_once() {
    let svc = Arc::new(service());
    let scenario = svc.create_scenario("Race", None).await.unwrap();

    let inserts = (1..=8).map(|seq| {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            svc.create_task(task_in(scenario.id, seq, "parallel", "alice"))
                .await
        })
    });
    for joined in futures::future::join_all(inserts).await {
        joined.expect("task panicked").expect("insert succeeded");
    }

    let board = svc.scenario_board(scenario.id).await.unwrap();
    assert_eq!(board.tasks.len(), 8);
    assert_eq!(board.tasks.iter().filter(|t| t.is_released()).count(), 1);
}

#[tokio::test]
async fn test_ties_are_parallel_steps() {
    let svc = service();
    let (_, tasks) = scenario_with(&svc, &[(1, "alice"), (1, "bob"), (2, "carlos")]).await;

    // Only the older of the two seq-1 tasks is bootstrapped.
    assert!(tasks[0].is_released());
    assert!(!tasks[1].is_released());

    let outcome = svc.complete_task(tasks[0].id, &Actor::new("alice")).await.unwrap();
    assert_eq!(outcome.kind(), OutcomeKind::NewlyReleasedSuccessor(tasks[2].id));
    assert!(!svc.get_task(tasks[1].id).await.unwrap().is_released());

    // A coordinator unlocks the peer by hand.
    let peer = svc.release_task(tasks[1].id).await.unwrap();
    assert!(peer.is_released());
}

#[tokio::test]
async fn test_ungrouped_tasks_form_one_group() {
    let svc = service();
    let loose = |seq: i32, owner: &str| NewTask {
        scenario_id: None,
        sequence_number: seq,
        description: format!("loose {seq}"),
        owner: owner.to_string(),
    };

    let a = svc.create_task(loose(1, "alice")).await.unwrap();
    let b = svc.create_task(loose(2, "bob")).await.unwrap();
    let grouped = svc.create_scenario("Other", None).await.unwrap();
    let c = svc
        .create_task(task_in(grouped.id, 1, "grouped", "carlos"))
        .await
        .unwrap();

    assert!(a.is_released());
    assert!(!b.is_released());
    assert!(c.is_released(), "scenarios bootstrap independently");

    let outcome = svc.complete_task(a.id, &Actor::new("alice")).await.unwrap();
    assert_eq!(outcome.kind(), OutcomeKind::NewlyReleasedSuccessor(b.id));
    assert_eq!(svc.list_ungrouped_tasks().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_scenario_removes_tasks() {
    let svc = service();
    let (scenario_id, tasks) = scenario_with(&svc, &[(1, "alice"), (2, "bob")]).await;

    svc.delete_scenario(scenario_id).await.unwrap();

    for t in &tasks {
        assert!(matches!(
            svc.get_task(t.id).await,
            Err(WorkflowError::TaskNotFound(_))
        ));
    }
    assert!(svc.list_scenarios().await.unwrap().is_empty());
    assert!(matches!(
        svc.delete_scenario(scenario_id).await,
        Err(WorkflowError::ScenarioNotFound(_))
    ));
}
