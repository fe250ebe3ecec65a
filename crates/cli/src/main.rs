mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shellac", version)]
#[command(about = "shellac is an inventory tool for music collections")]
#[command(
    long_about = "Manages and explores digital and physical music libraries.\n\n\
                  The serving API reads the catalog this tool versions; run the\n\
                  db commands to evolve the schema."
)]
struct Cli {
    /// Database to connect to
    #[arg(
        short = 'd',
        long = "database",
        global = true,
        default_value = shellac_db::DEFAULT_DATABASE_URL
    )]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database maintenance commands
    Db {
        #[command(subcommand)]
        db_command: DbCommands,
    },

    /// Start the shellac metadata server
    Serve {
        /// Port to run on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Prepare the database for migrations
    Init,
    /// Run all pending migrations
    Migrate,
    /// Rollback the last migration group
    Rollback,
    /// Lock database migrations
    Lock,
    /// Unlock database migrations
    Unlock,
    /// Display the current migration status
    Status,
    /// Mark migrations as applied without running them
    Mark,
    /// Unmark the last migration group without rolling back
    Unmark,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Db { db_command } => match db_command {
            DbCommands::Init => commands::db::init(&cli.database).await,
            DbCommands::Migrate => commands::db::migrate(&cli.database).await,
            DbCommands::Rollback => commands::db::rollback(&cli.database).await,
            DbCommands::Lock => commands::db::lock(&cli.database).await,
            DbCommands::Unlock => commands::db::unlock(&cli.database).await,
            DbCommands::Status => commands::db::status(&cli.database).await,
            DbCommands::Mark => commands::db::mark(&cli.database).await,
            DbCommands::Unmark => commands::db::unmark(&cli.database).await,
        },
        Commands::Serve { port } => commands::serve::run(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_db_subcommands() {
        let cli = Cli::parse_from(["shellac", "db", "migrate"]);
        assert!(matches!(
            cli.command,
            Commands::Db {
                db_command: DbCommands::Migrate
            }
        ));
        assert_eq!(cli.database, shellac_db::DEFAULT_DATABASE_URL);
    }

    #[test]
    fn database_flag_is_global() {
        let cli = Cli::parse_from(["shellac", "db", "status", "-d", "postgres://host/db"]);
        assert_eq!(cli.database, "postgres://host/db");
    }

    #[test]
    fn parses_serve_port() {
        let cli = Cli::parse_from(["shellac", "serve", "--port", "9000"]);
        assert!(matches!(cli.command, Commands::Serve { port: 9000 }));
    }
}
