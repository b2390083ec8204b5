use anyhow::Context;
use clap::Parser;
use tw_forecast_etl::core::{report, ConfigProvider};
use tw_forecast_etl::utils::error::ErrorSeverity;
use tw_forecast_etl::utils::{logger, validation::Validate};
use tw_forecast_etl::{ForecastEngine, ForecastPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-forecast")]
#[command(about = "Forecast export driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "forecast.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the region from the config file
    #[arg(long)]
    region: Option<String>,

    /// Dry run - show what would be fetched without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based forecast export");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(region) = args.region.clone() {
        tracing::info!("🔧 Region overridden to: {}", region);
        config.selection.region = Some(region);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No request will be sent");
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let timings = config.monitoring_enabled();
    let pipeline = ForecastPipeline::new(storage, config).context("failed to build pipeline")?;
    let engine = ForecastEngine::new_with_timings(pipeline, timings);

    match engine.run().await {
        Ok(outcome) => {
            println!("{}", report::render_text(&outcome.report));
            println!("📁 Output saved to: {}", outcome.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Forecast export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Source: {}", config.api_endpoint());
    println!("  Region: {}", config.preferred_region().unwrap_or("(first available)"));
    println!("  Cache TTL: {:?}", config.cache_ttl());
    println!("  Timeout: {:?}", config.request_timeout());
    println!("  Summary rows: {}", config.summary_rows());
    println!("  Output: {}/{}", config.output_path(), config.archive_name());
    println!("  Formats: {}", config.output_formats().join(", "));

    if config.accept_invalid_certs() {
        println!("  ⚠️ TLS certificate validation disabled");
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
