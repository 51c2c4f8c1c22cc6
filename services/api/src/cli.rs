use crate::demo::{
    run_demo, run_interaction_check, run_score, DemoArgs, InteractionCheckArgs, ScoreArgs,
};
use crate::server;
use appraisal::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Faculty Appraisal Engine",
    about = "Score, verify and reconcile faculty self-appraisals",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a JSON file of raw form entries and print the breakdown
    Score(ScoreArgs),
    /// Work with interaction mark spreadsheets
    Interactions {
        #[command(subcommand)]
        command: InteractionCommand,
    },
    /// Walk one appraisal through every phase against an in-memory store
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum InteractionCommand {
    /// Validate a sheet and print each faculty member's interaction average
    Check(InteractionCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Interactions {
            command: InteractionCommand::Check(args),
        } => run_interaction_check(args),
        Command::Demo(args) => run_demo(args),
    }
}
