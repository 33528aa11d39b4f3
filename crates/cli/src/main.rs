//! apiprobe CLI - Main Entry Point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use apiprobe_cli::commands::{
    auth, health, image, monitoring, offers, products, search, stores, users,
};
use apiprobe_cli::context::Context;
use apiprobe_cli::output;

/// apiprobe - test harness for the marketplace REST services
#[derive(Parser)]
#[command(name = "apiprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: ~/.apiprobe/config.toml)
    #[arg(long, env = "APIPROBE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the health endpoint
    Health,

    /// Sign in, sign up, sign out and inspect the session
    #[command(subcommand)]
    Auth(auth::AuthCommands),

    /// Manage users
    #[command(subcommand)]
    Users(users::UserCommands),

    /// Manage stores
    #[command(subcommand)]
    Stores(stores::StoreCommands),

    /// Manage products
    #[command(subcommand)]
    Products(products::ProductCommands),

    /// Manage offers
    #[command(subcommand)]
    Offers(offers::OfferCommands),

    /// Price monitoring
    #[command(subcommand)]
    Monitoring(monitoring::MonitoringCommands),

    /// Search users, stores, products and offers
    Search(search::SearchArgs),

    /// Image analysis
    #[command(subcommand)]
    Image(image::ImageCommands),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("apiprobe CLI v{}", apiprobe_common::VERSION);
        return Ok(());
    }

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::init(cli.config.as_deref(), cli.format).await?;

    match cli.command {
        Commands::Health => health::execute(&ctx).await?,
        Commands::Auth(cmd) => auth::execute(cmd, &ctx).await?,
        Commands::Users(cmd) => users::execute(cmd, &ctx).await?,
        Commands::Stores(cmd) => stores::execute(cmd, &ctx).await?,
        Commands::Products(cmd) => products::execute(cmd, &ctx).await?,
        Commands::Offers(cmd) => offers::execute(cmd, &ctx).await?,
        Commands::Monitoring(cmd) => monitoring::execute(cmd, &ctx).await?,
        Commands::Search(args) => search::execute(args, &ctx).await?,
        Commands::Image(cmd) => image::execute(cmd, &ctx).await?,
        Commands::Version => {}
    }

    Ok(())
}
