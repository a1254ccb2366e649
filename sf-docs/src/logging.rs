use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Output goes to stderr so stdout stays
/// clean for `--json` output and MCP frames. `RUST_LOG` overrides the
/// default level.
pub fn init(verbose: bool) {
    let default = if verbose { "sf_docs=debug" } else { "sf_docs=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
