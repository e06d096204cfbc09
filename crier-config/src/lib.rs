//! Loader for crier configuration with YAML + environment overlays.
//!
//! Sources merge in order: optional `crier.yaml`, then `CRIER_`-prefixed
//! environment variables (`__` separates nesting, so `CRIER_FEED__HANDLES`
//! lands on `feed.handles`). String values go through `${VAR}` expansion
//! before typed deserialisation, so secrets can stay in the environment. A
//! deployment with no config file at all is valid as long as the environment
//! carries everything [`CrierConfig::validate`] demands.

use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_EXPANSION_PASSES: usize = 8;

/// Sample-config placeholders that must never reach a running monitor.
pub const PLACEHOLDER_HANDLES: [&str; 3] = ["usuario1", "usuario2", "usuario3"];
pub const PLACEHOLDER_CHANNEL: &str = "tu_channel_id";
pub const PLACEHOLDER_FEED_TOKEN: &str = "tu_bearer_token";

/// Fatal configuration problems. Any of these must stop the process before
/// the first monitoring cycle.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration load failed: {0}")]
    Load(#[from] config::ConfigError),
    #[error("no feed handles configured")]
    MissingHandles,
    #[error("feed handles still hold sample-config placeholder values")]
    PlaceholderHandles,
    #[error("chat channel id is not configured")]
    MissingChannel,
    #[error("chat channel id still holds the sample-config placeholder value")]
    PlaceholderChannel,
    #[error("chat channel id must be numeric, got {0:?}")]
    NonNumericChannel(String),
    #[error("feed bearer token is not configured")]
    MissingFeedToken,
    #[error("feed bearer token still holds the sample-config placeholder value")]
    PlaceholderFeedToken,
    #[error("chat bot token is not configured")]
    MissingChatToken,
}

#[derive(Debug, Deserialize, Default)]
pub struct CrierConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub monitor: MonitorSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub keepalive: KeepaliveSection,
}

#[derive(Debug, Deserialize)]
pub struct FeedSection {
    #[serde(default)]
    pub bearer_token: String,
    #[serde(default)]
    pub handles: Vec<String>,
    /// Most-recent posts requested per account per cycle.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            bearer_token: String::new(),
            handles: Vec::new(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ChatSection {
    #[serde(default)]
    pub bot_token: String,
    /// Destination channel id, numeric but kept as a string until validated.
    /// Accepts a bare integer too; unquoted YAML and env overlays parse
    /// snowflakes as numbers.
    #[serde(default, deserialize_with = "de_string_or_number")]
    pub channel_id: String,
}

fn de_string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct MonitorSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Posts containing this marker (case-insensitive) are never delivered.
    #[serde(default = "default_spoiler_tag")]
    pub spoiler_tag: String,
    /// When true, the first fetch for a handle only records a baseline cursor
    /// instead of delivering the historical page.
    #[serde(default)]
    pub skip_initial_backlog: bool,
    #[serde(default)]
    pub diagnostics: DiagnosticsLevel,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            spoiler_tag: default_spoiler_tag(),
            skip_initial_backlog: false,
            diagnostics: DiagnosticsLevel::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsLevel {
    #[default]
    Standard,
    Verbose,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default = "default_true")]
    pub stderr: bool,
    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: None,
            stderr: default_true(),
            format: default_log_format(),
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct KeepaliveSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_keepalive_port")]
    pub port: u16,
}

impl Default for KeepaliveSection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_keepalive_port(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}
fn default_interval_secs() -> u64 {
    300
}
fn default_spoiler_tag() -> String {
    "#spoilersie".into()
}
fn default_true() -> bool {
    true
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_keepalive_port() -> u16 {
    8080
}

impl CrierConfig {
    /// Enforce the fatal startup checks: the monitor must refuse to run on a
    /// missing or sample-config handle list, channel id, or token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let handles = self.normalized_handles();
        if handles.is_empty() {
            return Err(ConfigError::MissingHandles);
        }
        if handles
            .iter()
            .any(|h| PLACEHOLDER_HANDLES.contains(&h.as_str()))
        {
            return Err(ConfigError::PlaceholderHandles);
        }

        let token = self.feed.bearer_token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingFeedToken);
        }
        if token == PLACEHOLDER_FEED_TOKEN {
            return Err(ConfigError::PlaceholderFeedToken);
        }

        if self.chat.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingChatToken);
        }

        self.channel_id()?;
        Ok(())
    }

    /// Handle list with surrounding whitespace trimmed and empties dropped.
    /// Order is preserved; the monitor checks accounts in this order.
    pub fn normalized_handles(&self) -> Vec<String> {
        self.feed
            .handles
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Numeric destination channel id.
    pub fn channel_id(&self) -> Result<u64, ConfigError> {
        let raw = self.chat.channel_id.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingChannel);
        }
        if raw == PLACEHOLDER_CHANNEL {
            return Err(ConfigError::PlaceholderChannel);
        }
        raw.parse::<u64>()
            .map_err(|_| ConfigError::NonNumericChannel(raw.to_string()))
    }

    /// Cycle interval as a duration, floored at one second.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.monitor.interval_secs.max(1))
    }
}

/// Locate the config file: explicit path wins, then `./crier.yaml`, then the
/// user config directory. `None` means run from environment variables alone.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("crier.yaml");
    if local.exists() {
        return Some(local);
    }
    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("crier").join("crier.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAX_EXPANSION_PASSES {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (optional YAML + env overrides).
pub struct CrierConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CrierConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CrierConfigLoader {
    /// Start an empty loader. The `CRIER_` environment overlay is attached
    /// last, inside [`CrierConfigLoader::load`], so environment variables win
    /// over any file the builder picked up.
    ///
    /// ```
    /// use crier_config::CrierConfigLoader;
    ///
    /// let config = CrierConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.feed.page_size, 10);
    /// assert_eq!(config.monitor.interval_secs, 300);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a config file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet (tests, mostly).
    ///
    /// ```
    /// use crier_config::CrierConfigLoader;
    ///
    /// let cfg = CrierConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// feed:
    ///   bearer_token: "token"
    ///   handles: ["alpha", "beta"]
    /// chat:
    ///   bot_token: "bot"
    ///   channel_id: "1405060708090100"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.normalized_handles(), vec!["alpha", "beta"]);
    /// assert_eq!(cfg.channel_id().unwrap(), 1405060708090100);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// The environment overlay is merged here, after any files, so env values
    /// always win. Values are parsed into their target types, and
    /// `feed.handles` accepts a comma-separated list so one variable can
    /// carry several accounts. The merged tree is then expanded (`${VAR}`
    /// placeholders, recursively with a depth cap) before materialising the
    /// typed config.
    ///
    /// ```
    /// use crier_config::CrierConfigLoader;
    ///
    /// unsafe { std::env::set_var("FEED_TOKEN", "injected-from-env"); }
    ///
    /// let config = CrierConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// feed:
    ///   bearer_token: "${FEED_TOKEN}"
    ///   handles: ["alpha"]
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.feed.bearer_token, "injected-from-env");
    ///
    /// unsafe { std::env::remove_var("FEED_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<CrierConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("CRIER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("feed.handles"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize().map_err(ConfigError::Load)?;
        expand_env_in_value(&mut v);

        let typed: CrierConfig = serde_json::from_value(v)
            .map_err(|e| ConfigError::Load(config::ConfigError::Message(e.to_string())))?;
        Ok(typed)
    }
}
