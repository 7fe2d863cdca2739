use anyhow::Context;

use tracing::Level;

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};

use std::path::{Path, PathBuf};

const LOG_FILE_NAME: &str = "reflect.log";

#[derive(Debug, PartialEq, Eq)]
pub enum LogDestination {
    Stdout,
    File(PathBuf),
}

/// `""`, `"-"` and `"stdout"` log to stdout; a directory gets `reflect.log`
/// inside it.
pub fn resolve_log_destination(log_file: &str) -> LogDestination {
    if log_file.is_empty() || log_file == "-" || log_file.eq_ignore_ascii_case("stdout") {
        return LogDestination::Stdout;
    }

    let path = Path::new(log_file);
    if path.is_dir() {
        LogDestination::File(path.join(LOG_FILE_NAME))
    } else {
        LogDestination::File(path.to_path_buf())
    }
}

fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("log file path has no file name {path:?}"))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .with_context(|| format!("error opening log file {path:?}"))
}

/// Installs the global subscriber. The returned guard flushes buffered file
/// output when dropped, so it must live until the process exits.
pub fn init(log_file: &str, debug: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let max_level = if debug { Level::DEBUG } else { Level::INFO };

    let subscriber = tracing_subscriber::fmt().with_max_level(max_level);

    match resolve_log_destination(log_file) {
        LogDestination::Stdout => {
            subscriber.init();
            Ok(None)
        }
        LogDestination::File(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(&path)?);
            subscriber.with_ansi(false).with_writer(writer).init();
            Ok(Some(guard))
        }
    }
}
