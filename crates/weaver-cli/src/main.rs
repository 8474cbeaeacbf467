use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bootstrap;
mod commands;
mod downloads;
mod logging;

#[derive(Parser)]
#[command(name = "weaver")]
#[command(about = "Weaver - turn a prompt into a poem, an illustration, a narration and a PDF", long_about = None)]
struct Cli {
    /// Configuration directory to use instead of ~/.config/weaver
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weave a single poem and write its downloads
    Weave(commands::weave::WeaveArgs),
    /// Open the interactive poetry studio
    Studio {
        /// Name to greet you with
        #[arg(long)]
        name: Option<String>,
        /// Directory downloads are written to
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List every generation parameter and its choices
    Options,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file may carry GEMINI_API_KEY.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Options => commands::options::run(),
        Commands::Weave(args) => {
            let app = bootstrap::AppBootstrap::initialize(cli.config_dir.as_deref()).await?;
            commands::weave::run(&app, args).await
        }
        Commands::Studio { name, output } => {
            let app = bootstrap::AppBootstrap::initialize(cli.config_dir.as_deref()).await?;
            commands::studio::run(&app, name, output).await
        }
    }
}
