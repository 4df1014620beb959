//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_CHUNKING__CHUNK_SIZE=500`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::data_processor::ChunkingConfig;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(figment)
    }

    /// Wraps an already-assembled figment, validating the typed settings.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub answer: AnswerSettings,
    pub query: QuerySettings,
    pub stream: StreamSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.chunking.validate()?;
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be positive");
        }
        if self.query.default_top_k <= 0 {
            anyhow::bail!("query.default_top_k must be positive");
        }
        if self.query.max_top_k == 0 {
            anyhow::bail!("query.max_top_k must be positive");
        }
        if self.stream.target_pieces == 0 {
            anyhow::bail!("stream.target_pieces must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub lancedb_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self { Self { lancedb_dir: "data/lancedb".to_string() } }
}

impl StorageSettings {
    pub fn lancedb_path(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.lancedb_dir) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Directory holding `config.json`, `tokenizer.json` and the model weights.
    pub model_dir: Option<String>,
    pub dimension: usize,
    pub max_len: usize,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { model_dir: None, dimension: 384, max_len: 256, use_fake: false } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub simple_budget: usize,
    pub llm_context_budget: usize,
    pub timeout_secs: u64,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            temperature: 0.2,
            simple_budget: 1200,
            llm_context_budget: 6000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub default_top_k: i64,
    pub max_top_k: usize,
}

impl Default for QuerySettings {
    fn default() -> Self { Self { default_top_k: crate::types::DEFAULT_TOP_K, max_top_k: 50 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub piece_delay_ms: u64,
    pub min_piece_chars: usize,
    pub target_pieces: usize,
}

impl Default for StreamSettings {
    fn default() -> Self { Self { piece_delay_ms: 10, min_piece_chars: 20, target_pieces: 40 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self { Self { host: "0.0.0.0".to_string(), port: 8000, max_upload_bytes: 25 * 1024 * 1024 } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_apply_without_files() {
        Jail::expect_with(|_jail| {
            let settings = Config::load_for_env("dev").map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.chunking.chunk_size, 900);
            assert_eq!(settings.chunking.chunk_overlap, 150);
            assert_eq!(settings.answer.simple_budget, 1200);
            assert_eq!(settings.answer.llm_context_budget, 6000);
            assert_eq!(settings.query.default_top_k, 5);
            assert_eq!(settings.server.port, 8000);
            Ok(())
        });
    }

    #[test]
    fn env_file_and_vars_layer_in_order() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[chunking]\nchunk_size = 600\nchunk_overlap = 100\n[server]\nport = 9000\n")?;
            jail.create_file("config.prod.toml", "[server]\nport = 9100\n")?;
            jail.set_env("APP_CHUNKING__CHUNK_OVERLAP", "50");
            let config = Config::load_for_env("prod").map_err(|e| e.to_string())?;
            let settings = config.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.chunking.chunk_size, 600);
            assert_eq!(settings.chunking.chunk_overlap, 50);
            assert_eq!(settings.server.port, 9100);
            let port: u16 = config.get("server.port").map_err(|e| e.to_string())?;
            assert_eq!(port, 9100);
            Ok(())
        });
    }

    #[test]
    fn degenerate_chunking_is_rejected_at_load() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n")?;
            assert!(Config::load_for_env("dev").is_err());
            Ok(())
        });
    }

    #[test]
    fn non_positive_default_top_k_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("APP_QUERY__DEFAULT_TOP_K", "0");
            assert!(Config::load_for_env("dev").is_err());
            Ok(())
        });
    }

    #[test]
    fn resolve_keeps_absolute_and_joins_relative() {
        let base = Path::new("/srv/app");
        assert_eq!(resolve_with_base(base, "data/lancedb"), PathBuf::from("/srv/app/data/lancedb"));
        assert_eq!(resolve_with_base(base, "/var/lib/docrag"), PathBuf::from("/var/lib/docrag"));
    }
}
