//! Configuration for the jindex indexer.
//!
//! A [`JindexConfig`] is loaded from TOML and handed to the components that
//! need it; nothing in the workspace reads configuration from global state.
//!
//! ```toml
//! [indexer]
//! class_file_extensions = ["class"]
//! archive_extensions = ["jar", "zip", "jmod"]
//! self_test = false
//! cache_dir = "/var/cache/jindex"
//! gc_unused_after_ms = 0
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JindexConfig {
    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerConfig {
    /// Extensions (without the dot, case-insensitive) of loose class files.
    #[serde(default = "IndexerConfig::default_class_file_extensions")]
    pub class_file_extensions: Vec<String>,

    /// Extensions of archives that are opened as zip files.
    #[serde(default = "IndexerConfig::default_archive_extensions")]
    pub archive_extensions: Vec<String>,

    /// Re-read every indexed type from the index and compare it with the
    /// class file it came from.
    #[serde(default)]
    pub self_test: bool,

    /// Directory holding the persisted index. When unset the index lives only
    /// in memory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Resources that left the workspace are deleted once they have been
    /// unused for this long.
    #[serde(default)]
    pub gc_unused_after_ms: u64,
}

impl IndexerConfig {
    fn default_class_file_extensions() -> Vec<String> {
        vec!["class".to_owned()]
    }

    fn default_archive_extensions() -> Vec<String> {
        vec!["jar".to_owned(), "zip".to_owned(), "jmod".to_owned()]
    }

    pub fn is_class_file(&self, path: &Path) -> bool {
        has_extension(path, &self.class_file_extensions)
    }

    pub fn is_archive(&self, path: &Path) -> bool {
        has_extension(path, &self.archive_extensions)
    }

    /// Location of the persisted index inside [`cache_dir`](Self::cache_dir).
    pub fn index_file(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join("index.bin"))
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            class_file_extensions: Self::default_class_file_extensions(),
            archive_extensions: Self::default_archive_extensions(),
            self_test: false,
            cache_dir: None,
            gc_unused_after_ms: 0,
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    /// The configured level as filter directives. Bare level names are
    /// matched case-insensitively and `warning` is accepted for `warn`.
    pub fn directives(&self) -> String {
        let level = self.level.trim();
        if level.is_empty() {
            return Self::default_level();
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        let lowered = level.to_ascii_lowercase();
        if lowered == "warning" {
            return "warn".to_owned();
        }
        if LEVELS.contains(&lowered.as_str()) {
            return lowered;
        }
        level.to_owned()
    }

    /// The effective filter: the configured directives followed by `RUST_LOG`
    /// when it is set.
    pub fn env_filter(&self) -> EnvFilter {
        let from_env = std::env::var("RUST_LOG").ok();
        self.filter_with(from_env.as_deref())
    }

    /// Builds the filter from the configured directives and `extra` ones.
    ///
    /// Unparseable input degrades step by step: the merged string, then
    /// `extra` alone, then the configured directives, then `info`.
    fn filter_with(&self, extra: Option<&str>) -> EnvFilter {
        let own = self.directives();
        let extra = extra.map(str::trim).filter(|value| !value.is_empty());
        let candidates = match extra {
            Some(extra) => vec![format!("{own},{extra}"), extra.to_owned(), own],
            None => vec![own],
        };
        candidates
            .into_iter()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` quotes the offending source line.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl JindexConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: JindexConfig = toml::from_str(text)?;
        config.indexer.normalize();
        Ok(config)
    }
}

impl IndexerConfig {
    /// Strips leading dots so `".jar"` and `"jar"` mean the same thing.
    fn normalize(&mut self) {
        for ext in self
            .class_file_extensions
            .iter_mut()
            .chain(self.archive_extensions.iter_mut())
        {
            if let Some(stripped) = ext.strip_prefix('.') {
                *ext = stripped.to_owned();
            }
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// Only the first call has an effect; later calls (and calls made after some
/// other subscriber was installed) are ignored.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry()
            .with(config.env_filter())
            .with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!(
                target: "jindex.config",
                level = %config.level,
                json = config.json,
                "tracing initialized"
            );
        }
    });
}
