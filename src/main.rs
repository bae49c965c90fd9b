use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ticketdesk::commands::{
    LsOptions, ReplayOptions, cmd_config_show, cmd_ls, cmd_replay, cmd_window,
};
use ticketdesk::inbox::window::ViewMode;
use ticketdesk::{Choice, InboxConfig, SortField, TicketPriority, TicketStatus};

#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(about = "Support-ticket inbox engine")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of a ticket fixture
    Ls {
        /// JSON array of tickets
        file: PathBuf,

        /// Case-insensitive text matched against subject and customer
        #[arg(short, long)]
        search: Option<String>,

        /// open, pending, closed or all
        #[arg(long, default_value = "all")]
        status: Choice<TicketStatus>,

        /// low, medium, high or all
        #[arg(long, default_value = "all")]
        priority: Choice<TicketPriority>,

        /// date, priority, status, subject, customer or company
        #[arg(long, default_value = "date")]
        sort: SortField,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Page number (1-indexed)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        json: bool,
    },

    /// Show which rows a viewport materializes
    Window {
        /// Number of rows in the list
        #[arg(long)]
        count: usize,

        /// Scroll offset in pixels
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// comfortable or compact
        #[arg(long)]
        mode: Option<ViewMode>,

        #[arg(long)]
        json: bool,
    },

    /// Replay an NDJSON push-event log into a store
    Replay {
        log: PathBuf,

        /// Tickets resident before the replay
        #[arg(long)]
        fixture: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show {
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TICKETDESK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match InboxConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Ls {
            file,
            search,
            status,
            priority,
            sort,
            desc,
            page,
            json,
        } => {
            cmd_ls(
                &file,
                LsOptions {
                    search,
                    status,
                    priority,
                    sort,
                    descending: desc,
                    page,
                    output_json: json,
                },
                config,
            )
            .await
        }
        Commands::Window {
            count,
            offset,
            mode,
            json,
        } => cmd_window(count, offset, mode, &config, json),
        Commands::Replay { log, fixture, json } => {
            cmd_replay(
                ReplayOptions {
                    log,
                    fixture,
                    output_json: json,
                },
                &config,
            )
            .await
        }
        Commands::Config {
            action: ConfigAction::Show { json },
        } => cmd_config_show(&config, cli.config.as_deref(), json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
