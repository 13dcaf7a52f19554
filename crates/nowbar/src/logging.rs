use nowbar_core::config::AppConfig;
use nowbar_core::CoreError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Standard output is reserved for the JSON
/// protocol, so diagnostics go to stderr or, when enabled, a log file.
///
/// The returned guard flushes the file writer on drop; keep it alive.
pub fn init(config: &AppConfig) -> Result<Option<WorkerGuard>, CoreError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));

    if !config.general.enable_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let path = config.log_path();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());
    let file_name = path
        .file_name()
        .ok_or_else(|| CoreError::Config(format!("invalid log file path: {}", path.display())))?;
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn default_directives(config: &AppConfig) -> String {
    let level = config.log_level().as_str().to_lowercase();
    ["nowbar", "nowbar_core", "nowbar_detect"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
