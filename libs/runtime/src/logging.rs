use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::{level_filters::LevelFilter, Level, Metadata, Subscriber};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::config::{LoggingConfig, Section};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// `None` means the output is switched off.
fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// `target` is `name` itself or one of its submodules.
fn in_subsystem(target: &str, name: &str) -> bool {
    target
        .strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

// -------- rotating file output --------

#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl RotatingFile {
    fn open(path: &Path, section: &Section) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
        let limit = match (section.max_backups, section.max_age_days) {
            (Some(files), _) => FileLimit::MaxFiles(files),
            (None, Some(days)) => FileLimit::Age(chrono::Duration::days(i64::from(days))),
            (None, None) => FileLimit::Age(chrono::Duration::days(1)),
        };
        let rot = FileRotate::new(
            path,
            AppendTimestamp::default(limit),
            ContentLimit::BytesSurpassed(max_bytes as usize),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rot))))
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Open the file configured for a section; failures are reported and the file skipped.
fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<RotatingFile> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = resolve_log_path(&section.file, base_dir);
    match RotatingFile::open(&path, section) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!(
                "Failed to open log file for '{name}' at {}: {e}",
                path.display()
            );
            None
        }
    }
}

// -------- layers --------

fn console_layer<S>(ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .boxed()
}

fn json_file_layer<S>(file: RotatingFile) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(file)
        .boxed()
}

/// Everything not claimed by an explicit subsystem, up to `level`.
fn catch_all_filter(
    claimed: Vec<String>,
    level: Level,
) -> FilterFn<impl Fn(&Metadata<'_>) -> bool + Send + Sync + 'static> {
    FilterFn::new(move |meta: &Metadata<'_>| {
        !claimed.iter().any(|name| in_subsystem(meta.target(), name)) && *meta.level() <= level
    })
}

fn build_layers(cfg: &LoggingConfig, base_dir: &Path, ansi: bool) -> Vec<BoxedLayer<Registry>> {
    let subsystems: Vec<(&String, &Section)> = cfg
        .iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .collect();
    let claimed: Vec<String> = subsystems.iter().map(|(name, _)| (*name).clone()).collect();

    let mut layers: Vec<BoxedLayer<Registry>> = Vec::new();

    // Subsystem console output shares one layer; files are one layer each.
    let mut console_targets = Targets::new().with_default(LevelFilter::OFF);
    for (name, section) in &subsystems {
        if let Some(level) = parse_level(&section.console_level) {
            console_targets = console_targets.with_target(name.as_str(), level);
        }
        if let (Some(level), Some(file)) = (
            parse_level(&section.file_level),
            open_section_file(name, section, base_dir),
        ) {
            let targets = Targets::new()
                .with_default(LevelFilter::OFF)
                .with_target(name.as_str(), level);
            layers.push(json_file_layer(file).with_filter(targets).boxed());
        }
    }
    layers.push(console_layer(ansi).with_filter(console_targets).boxed());

    if let Some(default) = cfg.get(DEFAULT_SECTION) {
        if let Some(level) = parse_level(&default.console_level) {
            layers.push(
                console_layer(ansi)
                    .with_filter(catch_all_filter(claimed.clone(), level))
                    .boxed(),
            );
        }
        if let (Some(level), Some(file)) = (
            parse_level(&default.file_level),
            open_section_file(DEFAULT_SECTION, default, base_dir),
        ) {
            layers.push(
                json_file_layer(file)
                    .with_filter(catch_all_filter(claimed, level))
                    .boxed(),
            );
        }
    }

    layers
}

/// Install the global subscriber described by `cfg`.
///
/// `base_dir` anchors relative log file paths (normally `server.home_dir`). Calling this
/// more than once keeps the first subscriber.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let ansi = std::io::stdout().is_terminal();
    let layers = build_layers(cfg, base_dir, ansi);
    let _ = Registry::default().with(layers).try_init();
}
