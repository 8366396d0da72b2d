use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

const DEFAULT_LOG_FILTER: &str = "warn,gemcli=info";
const DEFAULT_LOG_FILE_PATH: &str = "logs/gemcli.log";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogOutput {
    Stderr,
    File,
    Both,
}

#[derive(Debug)]
struct LogSettings {
    format: LogFormat,
    output: LogOutput,
    file_path: PathBuf,
}

impl LogSettings {
    fn from_env() -> Self {
        Self {
            format: parse_log_format(env::var("LOG_FORMAT").ok().as_deref()),
            output: parse_log_output(env::var("LOG_OUTPUT").ok().as_deref()),
            file_path: parse_log_file_path(env::var("LOG_FILE_PATH").ok().as_deref()),
        }
    }
}

fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match raw.unwrap_or("pretty").trim().to_ascii_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

fn parse_log_output(raw: Option<&str>) -> LogOutput {
    match raw.unwrap_or("stderr").trim().to_ascii_lowercase().as_str() {
        "file" => LogOutput::File,
        "both" => LogOutput::Both,
        _ => LogOutput::Stderr,
    }
}

fn parse_log_file_path(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_PATH))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn file_writer(path: &Path) -> std::io::Result<BoxMakeWriter> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| std::ffi::OsStr::new("gemcli.log"));

    fs::create_dir_all(dir)?;
    // synchronous writes: the process may exit right after the last log
    // line, which would lose output buffered in a background worker
    let appender = tracing_appender::rolling::daily(dir, file_name);
    Ok(BoxMakeWriter::new(appender))
}

fn select_writer(settings: &LogSettings) -> BoxMakeWriter {
    let stderr = BoxMakeWriter::new(std::io::stderr);
    match settings.output {
        LogOutput::Stderr => stderr,
        LogOutput::File | LogOutput::Both => match file_writer(&settings.file_path) {
            Ok(file) => {
                if settings.output == LogOutput::Both {
                    BoxMakeWriter::new(std::io::stderr.and(file))
                } else {
                    file
                }
            }
            Err(err) => {
                eprintln!(
                    "gemcli: failed to open log file '{}': {}; logging to stderr instead",
                    settings.file_path.display(),
                    err
                );
                stderr
            }
        },
    }
}

/// Installs the global subscriber. Stdout stays reserved for conversation
/// output; logs go to stderr and/or a daily-rolling file.
pub fn init() {
    let settings = LogSettings::from_env();
    let writer = select_writer(&settings);

    let result = match settings.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(writer)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(writer)
            .try_init(),
    };
    let _ = result;
}
