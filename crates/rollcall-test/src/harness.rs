//! Logging harness for tests.

use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the libtest writer.
///
/// `RUST_LOG` wins over `default_filter`. Safe to call from every test;
/// only the first call installs a subscriber.
pub fn init_test_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
