//! Tracing setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Where the process is running, which decides the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Inside AWS Lambda: JSON lines for CloudWatch.
    Lambda,
    /// A developer or operator terminal.
    Local,
}

impl Environment {
    pub fn detect() -> Self {
        Self::from_function_name(std::env::var("AWS_LAMBDA_FUNCTION_NAME").ok())
    }

    fn from_function_name(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Environment::Lambda,
            _ => Environment::Local,
        }
    }
}

/// Loads `.env` if present and installs the global subscriber.
///
/// `RUST_LOG` controls filtering and defaults to `info`.
pub fn init() -> Environment {
    dotenvy::dotenv().ok();

    let env = Environment::detect();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match env {
        Environment::Lambda => {
            tracing_subscriber::fmt()
                .with_ansi(false)
                .with_env_filter(filter)
                .without_time()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .init();
        }
        Environment::Local => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .compact()
                .init();
        }
    }

    env
}
