//! `moz-admin`: management commands for the Moz Solidária backend.

mod commands;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mozsolidaria_common::{AppResult, Config};
use mozsolidaria_core::PermissionService;
use mozsolidaria_db::repositories::{PermissionRepository, UserRepository};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "moz-admin")]
#[command(about = "Moz Solidária administration commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the configured permission groups and sync their permissions.
    SetupPermissions {
        /// Also delete groups that are not in the configured table.
        #[arg(long, default_value_t = false)]
        reset: bool,
    },
    /// Add a user to a permission group.
    AssignUserGroup {
        username: Option<String>,
        group: Option<String>,
        /// Print the configured groups and exit.
        #[arg(long, default_value_t = false)]
        list_groups: bool,
    },
}

async fn connect() -> AppResult<PermissionService> {
    let config = Config::load()?;
    let db = Arc::new(mozsolidaria_db::init(&config).await?);
    Ok(PermissionService::new(
        PermissionRepository::new(Arc::clone(&db)),
        UserRepository::new(db),
    ))
}

async fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Command::SetupPermissions { reset } => {
            let service = connect().await?;
            let report = service.create_groups_and_assign_permissions(reset).await?;
            print!("{}", commands::format_sync_report(&report));
        }
        Command::AssignUserGroup {
            username,
            group,
            list_groups,
        } => {
            let groups = PermissionService::configured_groups();
            if list_groups {
                print!("{}", commands::format_group_list(&groups));
                return Ok(());
            }

            let (Some(username), Some(group)) = (username, group) else {
                println!("Usage: moz-admin assign-user-group <username> <group>");
                print!("{}", commands::format_group_list(&groups));
                return Ok(());
            };

            let service = connect().await?;
            let outcome = service.assign_user_to_group(&username, &group).await;
            print!(
                "{}",
                commands::format_assignment(&outcome, &username, &group, &groups)
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mozsolidaria=info".into()),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
