use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "boing=info,boing_core=info";

/// Installs the stderr fmt subscriber. `RUST_LOG` overrides the default filter.
pub(crate) fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
