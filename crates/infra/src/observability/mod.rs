//! Tracing subscriber setup

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` when a global
/// subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_reports_existing_subscriber() {
        let _ = init_tracing("azauth=debug");
        assert!(!init_tracing("azauth=debug"));
    }
}
