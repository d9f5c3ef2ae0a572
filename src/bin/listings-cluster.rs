use clap::{Parser, Subcommand};
use listings_cluster::cli::{self as prog_cli, Command};
use listings_cluster::config::{AppConfig, ConfigOverrides};
use listings_cluster::driver::Driver;
use listings_cluster::logger;
use listings_cluster::store::MongoConnector;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "listings-cluster", version, about = "Run listings queries against a MongoDB cluster", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, the default locations are searched.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Connection string (mongodb:// or mongodb+srv://). Takes precedence over config/env.")]
    uri: Option<String>,
    #[arg(long, help = "Database name. Takes precedence over config/env.")]
    database: Option<String>,
    #[arg(long, help = "Log level: error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the listings and reviews queries (default)")]
    Run,
    #[command(about = "Import NDJSON, JSON-array or CSV records into a collection")]
    Import {
        collection: String,
        file: PathBuf,
        #[arg(long, help = "ndjson|csv; detected from the file when omitted")]
        format: Option<String>,
        #[arg(long, help = "Parse numbers and booleans in CSV fields")]
        infer_types: bool,
    },
    #[command(name = "drop-all", about = "Drop every collection in the database")]
    DropAll {
        #[arg(long, help = "Confirm the drop")]
        yes: bool,
    },
    #[command(name = "list-collections", about = "List the collections in the database")]
    ListCollections,
}

impl From<Commands> for Command {
    fn from(c: Commands) -> Self {
        match c {
            Commands::Run => Self::Run,
            Commands::Import { collection, file, format, infer_types } => {
                Self::Import { collection, file, format, infer_types }
            }
            Commands::DropAll { yes } => Self::DropAll { confirmed: yes },
            Commands::ListCollections => Self::ListCollections,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        config_path: cli.config,
        connection_string: cli.uri,
        database_name: cli.database,
        log_level: cli.log_level,
    };
    let cfg = match AppConfig::load(&overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logger::configure_logging(cfg.log_dir.as_deref(), &cfg.log_level) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let connector = MongoConnector { app_name: Some("listings-cluster".to_string()) };
    let mut driver = Driver::new(cfg.connection.clone(), connector);
    let command = cli.command.map_or(Command::Run, Command::from);
    let mut stdout = std::io::stdout().lock();
    match prog_cli::run(&mut driver, &cfg, command, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_fatal() {
                log::error!("{e}. Exiting program.");
            } else {
                log::error!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}
