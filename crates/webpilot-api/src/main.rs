//! webpilot CLI entry point.
//!
//! Binary name: `wpilot`
//!
//! Parses CLI arguments, loads configuration and persisted state from the
//! data directory, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,webpilot=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "wpilot", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    if cli.no_heal {
        state.service.healer().set_enabled(false);
    }

    match cli.command {
        Commands::Init => cli::workflow::init(&state, cli.json).await?,

        Commands::Workflows => cli::workflow::list(&state, cli.json).await?,

        Commands::Show { name } => cli::workflow::show(&state, &name, cli.json).await?,

        Commands::Run { name, vars } => {
            cli::workflow::run(&state, &name, vars, cli.json).await?;
        }

        Commands::Prompt { prompt } => {
            cli::prompt::handle(&state, &prompt.join(" "), cli.json).await?;
        }

        Commands::Record { name } => cli::workflow::record(&state, &name, cli.json).await?,

        Commands::Create {
            name,
            steps,
            domain,
            description,
        } => {
            cli::workflow::create(&state, &name, steps, domain, description, cli.json).await?;
        }

        Commands::Exec { action, params } => {
            cli::workflow::exec(&state, &action, params, cli.json).await?;
        }

        Commands::Repairs { workflow } => {
            cli::repair::list(&state, workflow.as_deref(), cli.json)?;
        }

        Commands::Approve { id, yes } => cli::repair::approve(&state, &id, yes, cli.json).await?,

        Commands::Discard { id } => cli::repair::discard(&state, &id, cli.json).await?,

        Commands::Failures { workflow } => {
            cli::repair::failures(&state, workflow.as_deref(), cli.json)?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
