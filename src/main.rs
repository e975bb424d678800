use clap::{Parser, Subcommand};
use fragcheck::checker::FragmentationChecker;
use fragcheck::config::DbConfig;
use fragcheck::reporter::{ColorMode, Reporter};
use std::io::{self, Write};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SQL Server Index Fragmentation Analyzer - Reports index health with maintenance recommendations
#[derive(Parser, Debug)]
#[command(name = "fragcheck")]
#[command(version = "0.1.0")]
#[command(about = "SQL Server index fragmentation analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Color output
    #[arg(long = "color", value_enum, default_value = "auto")]
    color: ColorMode,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze index fragmentation in a single database
    Analyze {
        /// Server address (e.g. localhost, db-host,1434 or .\SQLEXPRESS); prompted for when omitted
        #[arg(short = 'S', long = "server", env = "MSSQL_SERVER")]
        server: Option<String>,

        /// Database name; prompted for when omitted
        #[arg(short = 'd', long = "database", env = "MSSQL_DATABASE")]
        database: Option<String>,

        /// Username
        #[arg(short = 'u', long = "username", env = "MSSQL_USER")]
        username: String,

        /// Password
        #[arg(short = 'p', long = "password", env = "MSSQL_PASSWORD")]
        password: String,

        /// Wait for Enter after printing the report
        #[arg(long = "pause", default_value_t = false)]
        pause: bool,
    },
    /// Analyze multiple databases from a YAML config file
    Config {
        /// Path to YAML config file
        #[arg(short = 'c', long = "config")]
        config_path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Analyze {
            server,
            database,
            username,
            password,
            pause,
        } => {
            let server = resolve_input(server, "SQL Server name (e.g. localhost or .\\SQLEXPRESS)")?;
            let database = resolve_input(database, "Database name")?;
            let config = DbConfig::new(&server, &database, &username, &password)?;

            info!("Analyzing index fragmentation for database: {}", config.database);
            let mut checker = FragmentationChecker::connect(config).await?;
            let results = checker.analyze().await?;

            let reporter = Reporter::new(cli.color);
            reporter.report(&results)?;

            if pause {
                wait_for_enter()?;
            }
        }
        Commands::Config { config_path } => {
            info!("Loading config from: {}", config_path);
            let configs = DbConfig::from_config_file(&config_path)?;

            for config in configs {
                info!("Analyzing index fragmentation for database: {}", config.database);
                let mut checker = FragmentationChecker::connect(config).await?;
                let results = checker.analyze().await?;

                let reporter = Reporter::new(cli.color);
                reporter.report(&results)?;
            }
        }
    }

    Ok(())
}

/// Returns the flag value when given, otherwise prompts for it on stdin.
/// Validation of the final value happens in DbConfig::new.
fn resolve_input(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }

    print!("{}: ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn wait_for_enter() -> anyhow::Result<()> {
    print!("\nPress Enter to exit...");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(())
}
