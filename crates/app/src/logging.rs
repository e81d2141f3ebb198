use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Installs a stderr fmt layer: `level` for meshbake targets, `WARN` for the
/// rest.
pub fn setup_tracing(level: Level) {
    let filter_layer = tracing_subscriber::filter::filter_fn(move |metadata| {
        let is_meshbake = metadata.target().starts_with("meshbake");
        let effective_level = if is_meshbake { level } else { Level::WARN };
        metadata.level() <= &effective_level
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter_layer))
        .init();
}

pub fn parse_level(value: &str) -> Result<Level, String> {
    match value.to_ascii_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" | "warning" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        other => Err(format!("unknown log level '{other}'")),
    }
}
