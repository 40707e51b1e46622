use once_cell::sync::OnceCell;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialise logging.
///
/// Without `debug` the level is forced to `info`, even if `RUST_LOG` is set.
/// With `debug` the default is `debug` and `RUST_LOG` may override it.
/// When `log_file` is given, output is also appended to that file.
/// Calling this more than once is harmless.
pub fn init(debug: bool, log_file: Option<&Path>) {
    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_writer = log_file.and_then(|path| {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = path.file_name()?;
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("cannot create log directory {}: {e}", dir.display());
            return None;
        }
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        Some((writer, guard))
    });

    let result = match file_writer {
        Some((writer, guard)) => {
            let result = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr.and(writer))
                .try_init();
            if result.is_ok() {
                let _ = FILE_GUARD.set(guard);
            }
            result
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if result.is_ok() {
        let debug_enabled = debug;
        tracing::debug!(debug = debug_enabled, "logging initialised");
    }
}
