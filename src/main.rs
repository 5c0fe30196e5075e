use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use daywise::commands::*;
use daywise::config::DayWiseConfig;
use daywise::device::DeviceId;
use daywise::schedule::LlmSchedulingEngine;

#[derive(Parser)]
#[command(name = "daywise", version)]
#[command(about = "Personal day planner with AI schedule suggestions", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task name (quoted if it has spaces)
        name: String,
        /// What the task involves
        #[arg(short, long)]
        description: String,
        /// Due date, YYYY-MM-DD or an RFC 3339 timestamp
        #[arg(short = 'D', long)]
        due: Option<String>,
        /// high, medium or low
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Estimated hours, e.g. 1 or 0.5
        #[arg(short = 'H', long, default_value = "1")]
        hours: String,
    },
    /// List tasks grouped by due status
    List {
        /// Leave out the Completed section
        #[arg(long)]
        hide_completed: bool,
    },
    /// Mark a task complete, or reopen a completed one
    Toggle {
        /// Task id or unique id prefix
        id: String,
    },
    /// Remove a task
    Remove {
        /// Task id or unique id prefix
        id: String,
    },
    /// Suggest a schedule for all open tasks
    Schedule,
    /// Print this installation's device identifier
    Device,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("daywise=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = DayWiseConfig::load(cli.config.as_deref())?;

    let result = match cli.command.unwrap_or(Commands::List { hide_completed: false }) {
        Commands::Add { name, description, due, priority, hours } => {
            let store = config.open_store(true)?;
            cmd_add(store.as_ref(), name, description, due, priority, hours, false).await.map(drop)
        }
        Commands::List { hide_completed } => {
            let store = config.open_store(false)?;
            cmd_list(store.as_ref(), hide_completed, false).await.map(drop)
        }
        Commands::Toggle { id } => {
            let store = config.open_store(true)?;
            cmd_toggle(store.as_ref(), id, false).await.map(drop)
        }
        Commands::Remove { id } => {
            let store = config.open_store(true)?;
            cmd_remove(store.as_ref(), id, false).await.map(drop)
        }
        Commands::Schedule => {
            let store = config.open_store(false)?;
            let engine = LlmSchedulingEngine::new(config.engine.to_llm_config());
            cmd_schedule(store.as_ref(), &engine, false).await.map(drop)
        }
        Commands::Device => {
            let id = DeviceId::load_or_create(&config.device_path())?;
            println!("{}", id);
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "daywise", &mut io::stdout());
            Ok(())
        }
    };

    // Commands already reported their error on stderr.
    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
