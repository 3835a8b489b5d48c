use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber for a host process.
///
/// `RUST_LOG` wins over `default_filter` when set. `json` switches the fmt
/// layer to one JSON object per line.
///
/// # Errors
///
/// Fails if `default_filter` is not a valid directive or a global
/// subscriber is already installed.
pub fn init(default_filter: &str, json: bool) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
    }
}
