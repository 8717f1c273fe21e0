use crate::batch::{run_notify, run_renew, BatchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use noprazo::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "NoPrazo Contract Control",
    about = "Run the contract-control HTTP service and its scheduled sweeps from the command line",
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
    /// Run a one-shot scheduled sweep, printing the run report as JSON
    Batch {
        #[command(subcommand)]
        command: BatchCommand,
    },
}

#[derive(Subcommand, Debug)]
enum BatchCommand {
    /// Send the expiry reminders due today
    Notify(BatchArgs),
    /// Roll over the auto-renewing contracts due today
    Renew(BatchArgs),
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
        Command::Batch {
            command: BatchCommand::Notify(args),
        } => run_notify(args),
        Command::Batch {
            command: BatchCommand::Renew(args),
        } => run_renew(args),
    }
}
