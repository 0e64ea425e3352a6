use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

/// Installs the global subscriber. `RUST_LOG` directives take precedence over
/// `level`; logs go to standard error, as compact lines or as JSON.
pub fn init(level: LevelFilter, json: bool) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    let fmt_layer = match json {
        true => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        false => fmt::layer().compact().with_target(false).with_writer(std::io::stderr).boxed(),
    };
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()
}
