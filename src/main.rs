use anyhow::Result;
use clap::{Parser, Subcommand};
use crm_analytics::{Classifier, MetricsAggregator};
use crm_core::config::AppConfig;
use crm_core::{DateWindow, HttpCrmClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "crm-metrics",
    about = "Messaging and appointment metrics over a CRM's conversation and calendar APIs",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/crm-metrics/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the upstream API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Compute messaging metrics once and print them as JSON
    Metrics {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: String,
        /// Location to aggregate
        #[arg(long)]
        location_id: String,
        /// Upstream credential
        #[arg(long, env = "GHL_API_KEY", hide_env_values = true)]
        api_key: String,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "crm_metrics=info,crm_server=info,crm_analytics=info,warn".into()
        }))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Apply CLI overrides.
    if let Some(api_base) = &cli.api_base {
        config.upstream.base_url = api_base.clone();
    }
    tracing::info!(
        "Upstream {} (API version {})",
        config.upstream.base_url,
        config.upstream.api_version
    );

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            crm_server::serve(config).await?;
        }
        Commands::Metrics {
            from,
            to,
            location_id,
            api_key,
        } => {
            let window = DateWindow::from_dates(&from, &to)?;
            let api = Arc::new(HttpCrmClient::new(&config.upstream)?);
            let aggregator = MetricsAggregator::new(api, Classifier::default());
            let result = aggregator.aggregate(&api_key, &location_id, &window).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Config { action } => {
            handle_config_command(action, &config, cli.config.as_deref())?;
        }
    }

    Ok(())
}

fn handle_config_command(
    action: Option<ConfigAction>,
    config: &AppConfig,
    path_override: Option<&std::path::Path>,
) -> Result<()> {
    let path = path_override
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                AppConfig::default().save_to(&path)?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
