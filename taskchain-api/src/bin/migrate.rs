//! # TaskChain Migration Tool
//!
//! Applies the embedded SQL migrations at deploy time. The API server never
//! migrates on start.
//!
//! ## Usage
//!
//! ```bash
//! taskchain-migrate              # create the database if needed, apply migrations
//! taskchain-migrate --status     # report applied/known migrations only
//! taskchain-migrate --seed-demo  # apply migrations, then create the demo scenario
//! taskchain-migrate --reset      # apply migrations, drop all scenarios and tasks, re-seed
//! ```
//!
//! `--reset` keeps user accounts.

use anyhow::{bail, Context};
use std::sync::Arc;
use taskchain_api::config::Config;
use taskchain_shared::{
    db::{
        migrations::{
            clear_workflow_data, ensure_database_exists, get_migration_status, run_migrations,
        },
        pool::{close_pool, create_pool},
    },
    store::PgStore,
    workflow::{NewTask, WorkflowService},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_SCENARIO: &str = "Projeto Demo";

const DEMO_TASKS: [(&str, &str); 4] = [
    ("Levantamento de Requisitos", "Alice"),
    ("Desenvolvimento Backend", "Bob"),
    ("Desenvolvimento Frontend", "Carlos"),
    ("Deploy em Produção", "Alice"),
];

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    status_only: bool,
    seed_demo: bool,
    reset: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Options> {
    let mut options = Options::default();
    for arg in args {
        match arg.as_str() {
            "--status" => options.status_only = true,
            "--seed-demo" => options.seed_demo = true,
            "--reset" => {
                options.reset = true;
                options.seed_demo = true;
            }
            other => {
                bail!("unknown argument: {other} (expected --status, --seed-demo or --reset)")
            }
        }
    }
    if options.status_only && options.seed_demo {
        bail!("--status cannot be combined with --seed-demo or --reset");
    }
    Ok(options)
}

/// Creates the demo scenario unless one with the same name already exists
async fn seed_demo(workflow: &WorkflowService) -> anyhow::Result<()> {
    let existing = workflow.list_scenarios().await?;
    if existing.iter().any(|s| s.name == DEMO_SCENARIO) {
        tracing::info!(name = DEMO_SCENARIO, "Demo scenario already present, skipping seed");
        return Ok(());
    }

    let scenario = workflow.create_scenario(DEMO_SCENARIO, None).await?;
    for (position, (description, owner)) in (1..).zip(DEMO_TASKS) {
        let task = workflow
            .create_task(NewTask {
                scenario_id: Some(scenario.id),
                sequence_number: position,
                description: description.to_string(),
                owner: owner.to_string(),
            })
            .await?;
        tracing::info!(
            task_id = task.id,
            owner,
            status = task.status().as_str(),
            "Seeded demo task"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskchain_api=info,taskchain_shared=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = parse_args(std::env::args().skip(1))?;
    let config = Config::from_env().context("Failed to load configuration")?;

    if !options.status_only {
        ensure_database_exists(&config.database.url)
            .await
            .context("Failed to create database")?;
    }

    let pool = create_pool(config.pool_config())
        .await
        .context("Failed to connect to database")?;

    if !options.status_only {
        run_migrations(&pool).await.context("Migration failed")?;
    }

    let status = get_migration_status(&pool).await?;
    tracing::info!(
        applied = status.applied_migrations,
        known = status.known_migrations,
        latest = ?status.latest_version,
        up_to_date = status.is_up_to_date,
        "Migration status"
    );

    if options.reset {
        clear_workflow_data(&pool)
            .await
            .context("Failed to clear scenarios and tasks")?;
    }

    if options.seed_demo {
        let workflow = WorkflowService::new(Arc::new(PgStore::new(pool.clone())));
        seed_demo(&workflow).await?;
    }

    close_pool(pool).await;
    Ok(())
}
