use crate::demo::{run_demo, run_schedule_preview, DemoArgs, ScheduleArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use property_ledger::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Property Ledger",
    about = "Run the landlord back office API or explore it from the command line",
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
    /// Walk through a sample portfolio and print its reports
    Demo(DemoArgs),
    /// Preview the installment schedule for a lease without storing it
    Schedule(ScheduleArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the directory uploaded documents are written to
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Schedule(args) => run_schedule_preview(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn schedule_arguments_parse_dates() {
        let cli = Cli::try_parse_from([
            "property-ledger-api",
            "schedule",
            "--total-rent",
            "12000",
            "--start",
            "2025-01-01",
            "--payments",
            "12",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Schedule(args)) => {
                assert_eq!(args.total_rent, 12_000.0);
                assert_eq!(args.payments, 12);
                assert_eq!(args.start.to_string(), "2025-01-01");
            }
            other => panic!("expected schedule command, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["property-ledger-api"]).expect("parses");
        assert!(cli.command.is_none());
    }
}
