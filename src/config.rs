use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub root: Root,
    pub server: Server,
    pub limits: Limits,
    pub logging: Logging,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Root { pub root_dir: PathBuf }

impl Default for Root {
    fn default() -> Self { Self { root_dir: PathBuf::from(".") } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self { Self { bind_addr: "127.0.0.1".to_string(), port: 8000 } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Limits {
    pub default_chunk_bytes: u64,
    pub max_chunk_bytes: u64,
    pub max_request_kb: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { default_chunk_bytes: 64 * 1024, max_chunk_bytes: 256 * 1024, max_request_kb: 4096 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Logging {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for Logging {
    fn default() -> Self { Self { format: LogFormat::Json, filter: "info".to_string() } }
}

/// Command-line values that win over whatever the config file says.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    pub fn apply(mut self, o: Overrides) -> Self {
        if let Some(host) = o.host { self.server.bind_addr = host; }
        if let Some(port) = o.port { self.server.port = port; }
        if let Some(root) = o.root { self.root.root_dir = root; }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.root.root_dir.is_dir() {
            anyhow::bail!("root_dir does not exist or is not a directory: {}", self.root.root_dir.display());
        }
        if self.server.bind_addr.trim().is_empty() { anyhow::bail!("bind_addr must not be empty"); }
        if self.limits.default_chunk_bytes == 0 { anyhow::bail!("default_chunk_bytes must be > 0"); }
        if self.limits.max_chunk_bytes == 0 { anyhow::bail!("max_chunk_bytes must be > 0"); }
        if self.limits.default_chunk_bytes > self.limits.max_chunk_bytes {
            anyhow::bail!("default_chunk_bytes must not exceed max_chunk_bytes");
        }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        Ok(())
    }
}
