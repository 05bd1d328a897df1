use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,sqlx=warn";
const DEBUG_FILTER: &str = "debug,sqlx=info";

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { DEBUG_FILTER } else { DEFAULT_FILTER }))
}

/// Initialize tracing subscriber with compact output on stdout.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info`, or `debug` when `debug` is set
pub fn init_logging_default(debug: bool) {
    let _ = fmt()
        .with_env_filter(env_filter(debug))
        .with_target(debug)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set
/// - Span fields (service, username) end up on every event
pub fn init_logging_json(debug: bool) {
    let _ = fmt()
        .with_env_filter(env_filter(debug))
        .with_target(false)
        .json()
        .with_current_span(true)
        .with_writer(io::stdout)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_logging_default(false);
        init_logging_json(true);
        tracing::info!("still logging");
    }
}
