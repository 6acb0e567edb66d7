use flexi_logger::{FileSpec, FlexiLoggerError, Logger, LoggerHandle};
use std::path::Path;

/// Starts the crate's logger, honoring `RUST_LOG` over `spec`.
///
/// Library consumers that bring their own `log` backend can skip this
/// entirely; the crate only ever emits through the `log` macros.
pub fn init(spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(spec)?.start()
}

/// Same as [`init`] but writes to a log file instead of stderr.
pub fn init_with_file(spec: &str, path: &Path) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(spec)?
        .log_to_file(FileSpec::try_from(path.to_path_buf())?)
        .print_message()
        .start()
}
