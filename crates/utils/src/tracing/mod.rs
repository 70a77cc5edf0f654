use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Boxed error returned when a global subscriber is already installed
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Initialize the tracing system
///
/// Honours `RUST_LOG`, defaulting to `info`. Logs go to stderr in the compact
/// format, without ANSI colours when stderr is not a terminal.
///
/// Call once at process start, before building any cache service:
///
/// ```no_run
/// fn main() -> Result<(), coalesce_utils::tracing::InitError> {
///     coalesce_utils::tracing::init()?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<(), InitError> {
    init_with_default("info")
}

/// Initialize tracing with `default_directive` when `RUST_LOG` is unset
pub fn init_with_default(default_directive: &str) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}
