use app_errors::{
    app_error, convenience, install_reporter, report_error, ErrorCode, ErrorContext, ErrorHandler,
    ErrorReporter, ReporterConfig,
};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("--- Reporting Example ---\n");

    // Defaults, then APP_ERRORS_* overrides.
    let mut config = ReporterConfig::default();
    for problem in config.apply_env() {
        println!("ignoring bad setting: {problem}");
    }
    println!("collector: {}{}", config.base_url, config.endpoint);

    let (reporter, worker) = ErrorReporter::from_config_with_worker(&config);
    let ledger = reporter.ledger().clone();
    install_reporter(reporter.clone());

    // 1. Direct report with caller context.
    let err = convenience::analysis_timeout();
    reporter
        .report(&err, Some(&json!({"component": "SummaryPanel", "rows": 1200})))
        .await;

    // 2. Through the process-wide reporter.
    let err = app_error!(ErrorCode::ColumnValidationFailed, ErrorContext::DataValidation, "column {} has no values", "age");
    report_error(&err, None::<&()>).await;

    // 3. From a handler at a UI boundary.
    let handler = ErrorHandler::new().with_reporting(Arc::new(reporter));
    let _ = handler.handle(convenience::network_error(), Some("ExportDialog"));

    if let Some(worker) = worker {
        worker.shutdown().await;
    }

    println!("\nDelivery ledger:");
    for record in ledger.all() {
        println!(
            "  {:<28} {:<38} {:<8} {} bytes",
            record.code, record.correlation_id, record.outcome, record.body_bytes
        );
    }
}
