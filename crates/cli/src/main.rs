use adrotate_core::RotationStore;
use adrotate_db::PgRotationStore;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adrotate")]
#[command(about = "Sponsor rotation admin tool", version)]
struct Args {
    #[arg(long, env = "ADROTATE_DATABASE_URL")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Point a module's rotation cursor back at position 1.
    ResetCursor {
        #[arg(long)]
        module: String,
    },
    /// Point a module's rotation cursor at a given link position.
    SetCursor {
        #[arg(long)]
        module: String,
        #[arg(long)]
        position: i32,
    },
    /// Assign a specific unit to a module for an issue.
    Assign {
        #[arg(long)]
        issue: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        unit: String,
    },
    /// Run a rotation pass for an issue.
    Run {
        #[arg(long)]
        issue: String,
    },
    /// Record usage for an issue's unconfirmed selections.
    Confirm {
        #[arg(long)]
        issue: String,
    },
    /// Print an issue's selections.
    Selections {
        #[arg(long)]
        issue: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    let pool = adrotate_db::connect(&args.database_url, 2).await?;
    let store = PgRotationStore::new(pool);

    execute(&store, args.command).await
}

async fn execute<S>(store: &S, command: Command) -> anyhow::Result<()>
where
    S: RotationStore + ?Sized,
{
    match command {
        Command::ResetCursor { module } => {
            adrotate_core::reset_module_cursor(store, &module).await?;
            print(&json!({ "moduleId": module, "rotationCursor": 1 }))
        }
        Command::SetCursor { module, position } => {
            adrotate_core::set_module_cursor(store, &module, position).await?;
            print(&json!({ "moduleId": module, "rotationCursor": position }))
        }
        Command::Assign {
            issue,
            module,
            unit,
        } => {
            let selection = adrotate_core::manually_assign_unit(store, &issue, &module, &unit).await?;
            print(&selection)
        }
        Command::Run { issue } => {
            let pass = adrotate_core::run_rotation_pass(store, &issue).await?;
            print(&pass)
        }
        Command::Confirm { issue } => {
            let found = store
                .get_issue(&issue)
                .await?
                .with_context(|| format!("issue {issue} not found"))?;
            let report = adrotate_core::confirm_usage(store, &issue, found.issue_date).await?;
            print(&report)
        }
        Command::Selections { issue } => {
            let selections = store.list_selections(&issue).await?;
            print(&selections)
        }
    }
}

fn print<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
