use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_cli_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("afip_client=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("afip_client=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON output for runs whose logs are shipped to a collector (cron billing runs).
pub fn init_json_logger(verbose: bool) {
    let default_directive = if verbose {
        "afip_client=debug,info"
    } else {
        "afip_client=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

/// Shortens a token or sign for log output.
pub fn redact(secret: &str) -> String {
    const VISIBLE: usize = 8;
    if secret.chars().count() <= VISIBLE {
        return "***".to_string();
    }
    let prefix: String = secret.chars().take(VISIBLE).collect();
    format!("{}...({} chars)", prefix, secret.chars().count())
}
