use clap::Parser;
use std::time::Duration;
use tw_forecast_etl::core::report;
use tw_forecast_etl::utils::error::{ErrorSeverity, ForecastError};
use tw_forecast_etl::utils::{logger, validation::Validate};
use tw_forecast_etl::{CliConfig, ForecastEngine, ForecastPipeline, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(None);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting tw-forecast CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let watch = config.watch_secs.map(Duration::from_secs);
    let force_refresh = config.refresh;
    let verbose = config.verbose;

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = match ForecastPipeline::new(storage, config) {
        Ok(pipeline) => pipeline.with_force_refresh(force_refresh),
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e));
        }
    };
    let engine = ForecastEngine::new_with_timings(pipeline, verbose);

    let Some(interval) = watch else {
        if let Err(e) = run_cycle(&engine).await {
            std::process::exit(exit_code(&e));
        }
        return Ok(());
    };

    tracing::info!("👀 Watch mode: refreshing every {:?}", interval);
    loop {
        // 監看模式下單一週期失敗不結束程式，等下一輪
        if let Err(e) = run_cycle(&engine).await {
            tracing::debug!(
                "Cycle failed with {:?} severity, retrying in {:?}",
                e.severity(),
                interval
            );
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, stopping");
                break;
            }
        }
    }

    Ok(())
}

async fn run_cycle<P: tw_forecast_etl::core::Pipeline>(
    engine: &ForecastEngine<P>,
) -> Result<(), ForecastError> {
    match engine.run().await {
        Ok(outcome) => {
            println!("{}", report::render_text(&outcome.report));
            println!("📁 Output saved to: {}", outcome.output_path);
            Ok(())
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Forecast refresh failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            Err(e)
        }
    }
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &ForecastError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
