use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, warn};
use std::path::PathBuf;
use villa_planner_server::cli_error::CliError;
use villa_planner_server::export::ExportFormat;
use villa_planner_server::{EventId, EventStatus};

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    if let Err(e) = run_command(args.command) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => villa_planner_server::web::serve(),
        Command::ListEvents { status } => {
            villa_planner_server::cli::manage_events::print_event_list(status)
        }
        Command::ExportGuests {
            event_id,
            format,
            output,
        } => villa_planner_server::cli::export_guests::export_guests(event_id, format, output),
        Command::SetEventStatus {
            event_id,
            status,
            yes,
        } => villa_planner_server::cli::manage_events::set_event_status(event_id, status, yes),
    }
}

/// Guest list and apartment assignment planner for the venue's wedding events
#[derive(Debug, Parser)]
#[clap(name = "villa_planner_server", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the web application
    Serve,
    /// Print a table of all events
    ListEvents {
        /// Only list events with this status (draft, submitted or final)
        #[clap(long)]
        status: Option<EventStatus>,
    },
    /// Export the guest list of an event
    ExportGuests {
        /// Id of the event
        event_id: EventId,
        #[clap(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// The path of the file to write to. Defaults to stdout.
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Change the lifecycle status of an event's guest list
    SetEventStatus {
        /// Id of the event
        event_id: EventId,
        /// New status (draft, submitted or final)
        status: EventStatus,
        /// Don't ask for confirmation when re-opening a guest list
        #[clap(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
