use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tokio_util::sync::CancellationToken;

use api_ingress::{ApiIngress, ApiIngressConfig};
use modkit::Dispatcher;
use runtime::{AppConfig, CliArgs};
use users::UsersModule;

mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const API_INGRESS: &str = "api_ingress";

/// Identity Provider API server
#[derive(Parser)]
#[command(name = "identity-server")]
#[command(about = "Identity Provider API server")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging, Path::new(&config.server.home_dir));
    tracing::info!(home_dir = %config.server.home_dir, "Identity server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let ingress_cfg: ApiIngressConfig = config.module_config(API_INGRESS)?;
    let shutdown = CancellationToken::new();

    let users = UsersModule::default();
    let dispatcher = users
        .register_requests(Dispatcher::builder())
        .context("failed to register users requests")?
        .build();
    tracing::debug!(?dispatcher, "dispatcher ready");
    let routes = users.register_rest(Router::new(), Arc::new(dispatcher))?;

    let ingress = ApiIngress::new(ingress_cfg, config.server.timeout_sec, shutdown.clone());
    let router = ingress.build_router(routes, Some(users.openapi()))?;
    let listener = ApiIngress::bind(&config.server.host, config.server.port).await?;

    shutdown::cancel_on_signal(shutdown);
    ingress.serve(listener, router).await?;

    tracing::info!("Identity server stopped");
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    config
        .module_config::<ApiIngressConfig>(API_INGRESS)
        .context("modules.api_ingress is invalid")?;

    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}
