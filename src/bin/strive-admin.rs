/// Operational commands for the reporting database.
///
/// Usage:
///   strive-admin check
///   strive-admin schema [--schema public]
///   strive-admin install-views [--print]

use clap::{Parser, Subcommand};

use strive_dashboard::{config::Config, db};

#[derive(Parser)]
#[command(name = "strive-admin", about = "Maintenance commands for the Strive reporting database")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify the database is reachable
    Check,
    /// List tables and columns
    Schema {
        #[arg(long, default_value = "public")]
        schema: String,
    },
    /// Create or refresh the reporting views
    InstallViews {
        /// Print the DDL instead of executing it
        #[arg(long)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    if let Command::InstallViews { print: true } = args.command {
        for view in db::views::definitions() {
            println!("{}", view.ddl());
        }
        return Ok(());
    }

    let config = Config::database_from_env()?;
    let pool = db::create_pool(&config).await?;

    match args.command {
        Command::Check => {
            db::check_connection(&pool).await?;
            tracing::info!("Database connection OK");
        }
        Command::Schema { schema } => {
            let columns = db::describe_schema(&pool, &schema).await?;
            if columns.is_empty() {
                tracing::warn!("No tables found in schema {}", schema);
            }
            let mut current = None;
            for col in &columns {
                if current != Some(col.table_name.as_str()) {
                    println!("{}.{}", schema, col.table_name);
                    current = Some(col.table_name.as_str());
                }
                let nullable = if col.is_nullable { "NULL" } else { "NOT NULL" };
                println!("  {:<32} {:<28} {}", col.column_name, col.data_type, nullable);
            }
        }
        Command::InstallViews { .. } => {
            tracing::info!("Installing reporting views...");
            db::views::install(&pool).await?;
            tracing::info!("Reporting views installed");
        }
    }

    Ok(())
}
