//! thinkgrade CLI: runs the evaluation gateway and drives practice sessions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod client;
mod commands;

const DEFAULT_STATE: &str = "thinkgrade-session.json";
const DEFAULT_GATEWAY: &str = "http://127.0.0.1:8787";
const DEFAULT_ORIGIN: &str = "http://localhost:5173";

#[derive(Parser)]
#[command(
    name = "thinkgrade",
    version,
    about = "Structured-thinking practice with LLM feedback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the evaluation gateway
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to bind (overrides config)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Print the evaluation prompt for an answer
    Prompt {
        /// Exercise id (e.g. "problem-1")
        #[arg(long)]
        exercise: String,

        /// Answer text
        #[arg(long)]
        answer: String,
    },

    /// Evaluate one answer directly against the configured LLM
    Evaluate {
        /// Exercise id
        #[arg(long)]
        exercise: String,

        /// Answer text
        #[arg(long)]
        answer: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the exercises
    Exercises,

    /// Save draft text for an exercise
    Draft {
        #[arg(long)]
        exercise: String,

        /// Draft text
        #[arg(long)]
        text: String,

        /// Session state file
        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,
    },

    /// Submit a draft to the gateway for scoring
    Submit {
        #[arg(long)]
        exercise: String,

        /// Gateway base URL
        #[arg(long, default_value = DEFAULT_GATEWAY)]
        gateway: String,

        /// Origin header sent to the gateway
        #[arg(long, default_value = DEFAULT_ORIGIN)]
        origin: String,

        /// Session state file
        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,
    },

    /// Reopen a low-scoring answer for editing
    Revise {
        #[arg(long)]
        exercise: String,

        /// Session state file
        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,
    },

    /// Change the current exercise (0-based index)
    Select {
        #[arg(long)]
        index: usize,

        /// Session state file
        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,
    },

    /// Show scores and progress
    Progress {
        /// Session state file
        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,
    },

    /// Create a starter thinkgrade.toml
    Init,
}

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thinkgrade=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, listen } => commands::serve::execute(config, listen).await,
        Commands::Prompt { exercise, answer } => commands::prompt::execute(&exercise, &answer),
        Commands::Evaluate {
            exercise,
            answer,
            config,
        } => commands::evaluate::execute(&exercise, &answer, config).await,
        Commands::Exercises => commands::exercises::execute(),
        Commands::Draft {
            exercise,
            text,
            state,
        } => commands::session::draft(&state, &exercise, &text),
        Commands::Submit {
            exercise,
            gateway,
            origin,
            state,
        } => commands::session::submit(&state, &exercise, &gateway, &origin).await,
        Commands::Revise { exercise, state } => commands::session::revise(&state, &exercise),
        Commands::Select { index, state } => commands::session::select(&state, index),
        Commands::Progress { state } => commands::progress::execute(&state),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
