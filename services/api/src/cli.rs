use crate::demo::{run_demo, run_path_report, DemoArgs, PathReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use coursepath::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Course Path Service",
    about = "Serve and inspect learning paths with prerequisite-gated courses",
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
    /// Inspect learning path definitions from the command line
    Path {
        #[command(subcommand)]
        command: PathCommand,
    },
    /// Build a sample path in memory and print a learner's view of it
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PathCommand {
    /// Render the learner layout of a path definition file
    Report(PathReportArgs),
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
        Command::Path {
            command: PathCommand::Report(args),
        } => run_path_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
