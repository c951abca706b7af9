use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/ChatServer/";
pub const DEFAULT_ACTIVE_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Default config path: `~/.parlor/client.toml`.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
	let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
	Ok(home.join(".parlor").join("client.toml"))
}

/// Load the client config from the default path and env overrides.
pub fn load_client_config() -> anyhow::Result<ClientConfig> {
	let path = default_config_path()?;
	load_client_config_from_path(&path)
}

/// Same as `load_client_config` but with an explicit config path.
pub fn load_client_config_from_path(path: &Path) -> anyhow::Result<ClientConfig> {
	let file_cfg = read_toml_if_exists(path)
		.with_context(|| format!("read config from {}", path.display()))?
		.unwrap_or_default();

	let mut cfg = ClientConfig::from_file(file_cfg);
	apply_env_overrides(&mut cfg);
	Ok(cfg)
}

/// Delays between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimings {
	/// After a batch that carried events.
	pub active_interval: Duration,
	/// After an empty batch.
	pub idle_interval: Duration,
}

impl Default for PollTimings {
	fn default() -> Self {
		Self {
			active_interval: DEFAULT_ACTIVE_INTERVAL,
			idle_interval: DEFAULT_IDLE_INTERVAL,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
	/// Service root; endpoint paths are appended to it.
	pub base_url: String,
	pub request_timeout: Duration,
	pub poll: PollTimings,
	/// Lines kept in the message log before the oldest are dropped.
	pub message_log_capacity: usize,
	pub user_agent: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			poll: PollTimings::default(),
			message_log_capacity: DEFAULT_LOG_CAPACITY,
			user_agent: format!("parlor-client/{}", env!("CARGO_PKG_VERSION")),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
	base_url: Option<String>,
	request_timeout_ms: Option<u64>,
	message_log_capacity: Option<usize>,
	user_agent: Option<String>,

	#[serde(default)]
	poll: FilePollSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FilePollSettings {
	active_interval_ms: Option<u64>,
	idle_interval_ms: Option<u64>,
}

impl ClientConfig {
	fn from_file(file: FileConfig) -> Self {
		let defaults = Self::default();
		Self {
			base_url: file
				.base_url
				.filter(|s| !s.trim().is_empty())
				.unwrap_or(defaults.base_url),
			request_timeout: file
				.request_timeout_ms
				.filter(|v| *v > 0)
				.map(Duration::from_millis)
				.unwrap_or(defaults.request_timeout),
			poll: PollTimings {
				active_interval: file
					.poll
					.active_interval_ms
					.map(Duration::from_millis)
					.unwrap_or(defaults.poll.active_interval),
				idle_interval: file
					.poll
					.idle_interval_ms
					.map(Duration::from_millis)
					.unwrap_or(defaults.poll.idle_interval),
			},
			message_log_capacity: file
				.message_log_capacity
				.filter(|v| *v > 0)
				.unwrap_or(defaults.message_log_capacity),
			user_agent: file
				.user_agent
				.filter(|s| !s.trim().is_empty())
				.unwrap_or(defaults.user_agent),
		}
	}
}

fn read_toml_if_exists(path: &Path) -> anyhow::Result<Option<FileConfig>> {
	match fs::read_to_string(path) {
		Ok(s) => {
			let cfg: FileConfig = toml::from_str(&s).context("parse TOML")?;
			Ok(Some(cfg))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
		Err(e) => Err(anyhow!(e).context("read config file")),
	}
}

fn apply_env_overrides(cfg: &mut ClientConfig) {
	apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut ClientConfig, get: impl Fn(&str) -> Option<String>) {
	if let Some(v) = get("PARLOR_BASE_URL") {
		let v = v.trim().to_string();
		if !v.is_empty() {
			cfg.base_url = v;
			info!("client config: base_url overridden by env");
		}
	}

	if let Some(v) = get("PARLOR_REQUEST_TIMEOUT_MS")
		&& let Ok(ms) = v.trim().parse::<u64>()
		&& ms > 0
	{
		cfg.request_timeout = Duration::from_millis(ms);
		info!(ms, "client config: request_timeout overridden by env");
	}

	if let Some(v) = get("PARLOR_POLL_ACTIVE_MS")
		&& let Ok(ms) = v.trim().parse::<u64>()
	{
		cfg.poll.active_interval = Duration::from_millis(ms);
		info!(ms, "client config: poll.active_interval overridden by env");
	}

	if let Some(v) = get("PARLOR_POLL_IDLE_MS")
		&& let Ok(ms) = v.trim().parse::<u64>()
	{
		cfg.poll.idle_interval = Duration::from_millis(ms);
		info!(ms, "client config: poll.idle_interval overridden by env");
	}

	if let Some(v) = get("PARLOR_LOG_CAPACITY")
		&& let Ok(capacity) = v.trim().parse::<usize>()
		&& capacity > 0
	{
		cfg.message_log_capacity = capacity;
		info!(capacity, "client config: message_log_capacity overridden by env");
	}
}
