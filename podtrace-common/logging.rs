use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber for the agent.\
/// Directives from the `RUST_LOG` environment variable take precedence over `default_directives`.
pub fn initialize(default_directives: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directives))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
