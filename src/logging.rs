use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `QUESTSIM_LOG=debug`.
pub const LOG_ENV: &str = "QUESTSIM_LOG";

/// Install a stderr subscriber for the binaries. Defaults to `warn` so
/// normal runs only print results on stdout.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
