use app_errors::{
    convenience, create_error_from_http, Caught, ErrorCode, ErrorContext, ErrorHandler, Result,
};
use serde_json::json;
use std::io;
use tracing_subscriber::EnvFilter;

const MAX_UPLOAD: u64 = 10 * 1024 * 1024;

fn check_upload(name: &str, size: u64) -> Result<()> {
    if size == 0 {
        return Err(convenience::file_empty());
    }
    if size > MAX_UPLOAD {
        return Err(convenience::file_size_exceeded(size, MAX_UPLOAD)
            .with_handler_context(format!("upload:{name}")));
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("--- Basic Usage Example ---\n");

    // 1. A validation failure built from the catalog.
    match check_upload("grades.csv", 15_728_640) {
        Ok(()) => println!("upload accepted"),
        Err(err) => {
            println!("1. [USER] {}", err.user_message());
            println!("   action:    {}", err.action());
            println!("   retry:     {}", err.can_retry());
            println!("   reference: {}", err.correlation_id());
            println!("   log line:  {}", err.log());
        }
    }

    // 2. An HTTP failure translated by status code.
    let err = create_error_from_http(
        429,
        Some(ErrorContext::Analysis),
        Some("req-8841"),
        Some(json!({"retryAfter": 30})),
    );
    println!("\n2. [HTTP 429] [{}] {}", err.code(), err.user_message());
    assert_eq!(err.code(), ErrorCode::RateLimitError);

    // 3. Whatever a boundary caught, normalized by the handler.
    let handler = ErrorHandler::new().on_error(|err, ctx| {
        println!("   callback: {} in {:?}", err.code(), ctx);
    });

    println!("\n3. [HANDLER]");
    let first = handler.handle(Caught::native(io::Error::other("connection reset by peer")), Some("ResultsPage"));
    let second = handler.handle(first.clone(), Some("ErrorBoundary"));
    println!("   passthrough kept id: {}", first.correlation_id() == second.correlation_id());

    // 4. Serialized shape, as sent to the collector.
    match serde_json::to_string_pretty(&second) {
        Ok(text) => println!("\n4. [WIRE]\n{text}"),
        Err(e) => println!("\n4. [WIRE] not serializable: {e}"),
    }
}
