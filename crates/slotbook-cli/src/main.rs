use clap::{Parser, Subcommand};
use slotbook_core::Role;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "slotbook", version, about = "Slotbook appointment book CLI")]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Business calendar and look-ahead
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Client records
    Client {
        #[command(subcommand)]
        action: commands::people::PersonAction,
    },
    /// Employee records
    Employee {
        #[command(subcommand)]
        action: commands::people::PersonAction,
    },
    /// Booking, reassignment and release
    Appointment {
        #[command(subcommand)]
        action: commands::appointment::AppointmentAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let out = commands::Output::new(cli.json);
    let result = match cli.command {
        Commands::Calendar { action } => commands::calendar::run(action, out),
        Commands::Client { action } => commands::people::run(Role::Client, action, out),
        Commands::Employee { action } => commands::people::run(Role::Employee, action, out),
        Commands::Appointment { action } => commands::appointment::run(action, out),
        Commands::Config { action } => commands::config::run(action, out),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
