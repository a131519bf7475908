use ssrf_core::Config;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` wins over `logging.level`.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = Config::load_or_default().logging.level;
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    // Only fails when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
