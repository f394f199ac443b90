//! Operator configuration: a JSON file, CLI overrides and environment
//! secrets, resolved once into an immutable [`AppConfig`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::load::TimestampParser;
use crate::model::schema::{self, Route, SchemaName, SchemaRegistry, TableSchema};
use crate::model::style::{self, StyleDescriptor, StyleTable};
use crate::persist::html::HtmlOptions;
use crate::persist::WritePolicy;
use crate::pipeline::Pipeline;
use crate::render::VolumeOptions;
use crate::render::volume::MAX_STRIKE_TICKS;
use crate::transform::{Band, TimeWindow};

pub const DEFAULT_CONFIG_FILE: &str = "gex-charts.json";
pub const DEFAULT_WEBHOOK_ENV: &str = "GEX_CHARTS_WEBHOOK_URL";

// ── File format ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigFile {
    /// Directory the data feed writes CSV files into.
    pub input_dir: PathBuf,
    /// Where artifacts go. Defaults to `input_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Recognized asset prefixes. Omit for the built-in list, `[]` for any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<String>>,
    /// File routes. Omit for the built-in routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,
    /// Extra schemas, or replacements for built-in ones by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<SchemaName, TableSchema>,
    /// Per-schema style overrides keyed by series name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<SchemaName, BTreeMap<String, StyleDescriptor>>,
    /// Time-of-day filter for time-series files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowConfig>,
    /// Per-schema replacement for `window`; `null` disables filtering for
    /// that schema.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schema_windows: BTreeMap<SchemaName, Option<WindowConfig>>,
    /// Strike band around spot for snapshot files.
    #[serde(default = "default_band")]
    pub band: Band,
    /// Required: `skip_existing` (build once) or `overwrite` (live refresh).
    pub write_policy: WritePolicy,
    /// Timestamp formats in priority order; the first is primary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timestamp_formats: Vec<String>,
    #[serde(default)]
    pub html: HtmlOptions,
    #[serde(default)]
    pub volume: VolumeOptions,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Process files already present when the watcher starts.
    #[serde(default = "default_true")]
    pub initial_scan: bool,
}

/// Inclusive `HH:MM[:SS]` bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Environment variable holding the webhook URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        WebhookConfig {
            enabled: false,
            url_env: default_url_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_band() -> Band {
    Band::Percent { value: 1.5 }
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

fn default_url_env() -> String {
    DEFAULT_WEBHOOK_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// ── Overrides ────────────────────────────────────────────────────────

/// Values from the command line that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub write_policy: Option<WritePolicy>,
    pub poll_interval_secs: Option<u64>,
    pub no_initial_scan: bool,
}

// ── Resolved config ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pipeline: Pipeline,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub webhook: Option<WebhookSettings>,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub initial_scan: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window `{start}`-`{end}` is not HH:MM[:SS]")]
    BadWindow { start: String, end: String },

    #[error("band {0:?} must be a positive offset (percent below 100)")]
    BadBand(Band),

    #[error("route `{suffix}` points to unknown schema `{schema}`")]
    UnknownSchema { suffix: String, schema: String },

    #[error("route suffix must not be empty")]
    EmptySuffix,

    #[error("schema `{schema}` needs at least two columns")]
    TooFewColumns { schema: String },

    #[error("schema `{schema}` refers to `{column}`, which is not one of its value columns")]
    UnknownColumn { schema: String, column: String },

    #[error("window given for unknown time-series schema `{schema}`")]
    UnknownWindowSchema { schema: String },

    #[error("styles given for unknown schema `{schema}`")]
    UnknownStyleSchema { schema: String },

    #[error("volume chart supports at most two extra price scales, got {count}")]
    TooManyScales { count: usize },

    #[error("volume tick_step and bar_height must be positive")]
    BadVolumeGeometry,

    #[error("band of ±{points} points at tick_step {step} needs more than {max} strike ticks")]
    TooManyTicks { points: f64, step: f64, max: usize },

    #[error("volume image size {width}x{height} is too small")]
    BadImageSize { width: u32, height: u32 },

    #[error("poll interval must be at least one second")]
    ZeroInterval,

    #[error("webhook enabled but environment variable `{var}` is not set")]
    WebhookUrlMissing { var: String },
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Validate and resolve, collecting every problem rather than the first.
    pub fn resolve(self, overrides: &Overrides) -> Result<AppConfig, Vec<ConfigError>> {
        let env = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        self.resolve_with_env(overrides, env)
    }

    pub fn resolve_with_env(
        self,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<AppConfig, Vec<ConfigError>> {
        let mut errors = Vec::new();

        let mut schemas = schema::builtin_schemas();
        schemas.extend(self.schemas);
        let routes = self.routes.unwrap_or_else(schema::builtin_routes);
        let assets = self.assets.unwrap_or_else(schema::builtin_assets);

        for route in &routes {
            if route.suffix.is_empty() {
                errors.push(ConfigError::EmptySuffix);
            }
            if !schemas.contains_key(&route.schema) {
                errors.push(ConfigError::UnknownSchema {
                    suffix: route.suffix.clone(),
                    schema: route.schema.clone(),
                });
            }
        }
        for (name, table_schema) in &schemas {
            errors.extend(check_schema(name, table_schema));
        }

        let mut styles = builtin_styles(&schemas);
        for (schema_name, overrides) in &self.styles {
            match styles.remove(schema_name) {
                Some(table) => {
                    styles.insert(schema_name.clone(), table.with_overrides(overrides));
                }
                None => errors.push(ConfigError::UnknownStyleSchema {
                    schema: schema_name.clone(),
                }),
            }
        }

        let window = self
            .window
            .as_ref()
            .and_then(|w| parse_window(w, &mut errors));
        let mut window_overrides = BTreeMap::new();
        for (schema_name, w) in &self.schema_windows {
            if !matches!(schemas.get(schema_name), Some(TableSchema::TimeSeries { .. })) {
                errors.push(ConfigError::UnknownWindowSchema {
                    schema: schema_name.clone(),
                });
                continue;
            }
            let parsed = w.as_ref().and_then(|w| parse_window(w, &mut errors));
            window_overrides.insert(schema_name.clone(), parsed);
        }

        if !self.band.is_valid() {
            errors.push(ConfigError::BadBand(self.band));
        }
        if self.volume.scales.len() > 2 {
            errors.push(ConfigError::TooManyScales {
                count: self.volume.scales.len(),
            });
        }
        if !(self.volume.tick_step.is_finite()
            && self.volume.tick_step > 0.0
            && self.volume.bar_height.is_finite()
            && self.volume.bar_height > 0.0)
        {
            errors.push(ConfigError::BadVolumeGeometry);
        }
        if let Band::Points { value } = self.band
            && self.volume.tick_step > 0.0
            && 2.0 * value / self.volume.tick_step > MAX_STRIKE_TICKS as f64
        {
            errors.push(ConfigError::TooManyTicks {
                points: value,
                step: self.volume.tick_step,
                max: MAX_STRIKE_TICKS,
            });
        }
        if self.volume.width < 200 || self.volume.height < 200 {
            errors.push(ConfigError::BadImageSize {
                width: self.volume.width,
                height: self.volume.height,
            });
        }

        let poll_interval_secs = overrides
            .poll_interval_secs
            .unwrap_or(self.poll_interval_secs);
        if poll_interval_secs == 0 {
            errors.push(ConfigError::ZeroInterval);
        }

        let webhook = if self.webhook.enabled {
            match env(&self.webhook.url_env) {
                Some(url) => Some(WebhookSettings {
                    url,
                    timeout: Duration::from_secs(self.webhook.timeout_secs),
                }),
                None => {
                    errors.push(ConfigError::WebhookUrlMissing {
                        var: self.webhook.url_env.clone(),
                    });
                    None
                }
            }
        } else {
            None
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let input_dir = overrides.input_dir.clone().unwrap_or(self.input_dir);
        let output_dir = overrides
            .output_dir
            .clone()
            .or(self.output_dir)
            .unwrap_or_else(|| input_dir.clone());

        Ok(AppConfig {
            pipeline: Pipeline {
                registry: SchemaRegistry::new(schemas, routes, assets),
                styles,
                timestamps: TimestampParser::new(self.timestamp_formats),
                window,
                window_overrides,
                band: self.band,
                policy: overrides.write_policy.unwrap_or(self.write_policy),
                html: self.html,
                volume: self.volume,
            },
            input_dir,
            output_dir,
            webhook,
            poll_interval: Duration::from_secs(poll_interval_secs),
            debounce: Duration::from_millis(self.debounce_ms),
            initial_scan: self.initial_scan && !overrides.no_initial_scan,
        })
    }
}

fn parse_window(w: &WindowConfig, errors: &mut Vec<ConfigError>) -> Option<TimeWindow> {
    let window = TimeWindow::parse(&w.start, &w.end);
    if window.is_none() {
        errors.push(ConfigError::BadWindow {
            start: w.start.clone(),
            end: w.end.clone(),
        });
    }
    window
}

fn check_schema(name: &str, table_schema: &TableSchema) -> Vec<ConfigError> {
    let columns = table_schema.columns();
    if columns.len() < 2 {
        return vec![ConfigError::TooFewColumns {
            schema: name.to_string(),
        }];
    }
    let values = &columns[1..];
    table_schema
        .referenced_columns()
        .into_iter()
        .filter(|c| !values.iter().any(|v| v == c))
        .map(|c| ConfigError::UnknownColumn {
            schema: name.to_string(),
            column: c.to_string(),
        })
        .collect()
}

/// Built-in style table for each schema that has one; other time-series
/// schemas get the neutral table with their spot column as reference.
fn builtin_styles(schemas: &BTreeMap<SchemaName, TableSchema>) -> BTreeMap<SchemaName, StyleTable> {
    schemas
        .iter()
        .filter_map(|(name, table_schema)| {
            let TableSchema::TimeSeries { spot, .. } = table_schema else {
                return None;
            };
            let table = match name.as_str() {
                schema::GEX_HISTORY => style::gex_history_styles(),
                schema::DATA_FLOW => style::data_flow_styles(),
                _ => StyleTable::default(),
            };
            Some((name.clone(), table.with_reference(spot.clone())))
        })
        .collect()
}

/// `--config` if given, else `./gex-charts.json`, else the user config dir.
pub fn default_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|d| d.join("gex-charts").join("config.json"))
        .unwrap_or(local)
}

/// Read, validate and resolve the config for a command.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_path);
    let file = ConfigFile::load(&path)?;
    file.resolve(overrides).map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::anyhow!(
            "Config {} is invalid:\n  {}",
            path.display(),
            msgs.join("\n  ")
        )
    })
}
