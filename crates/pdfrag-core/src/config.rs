use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

/// Environment variable holding the completion service credential.
pub const CREDENTIAL_VAR: &str = "OPENAI_API_KEY";

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Layered configuration for the environment named by `RUST_ENV` (default `dev`).
    /// Files are read lazily; errors surface from [`Config::settings`].
    pub fn load() -> Self {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self { figment: figment_for_env(&env_name) }
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    /// Extract and validate the typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Defaults, then `config.toml`, then `config.<env>.toml`, then `APP_*`
/// variables (`__` separates sections), then the raw credential variable.
pub fn figment_for_env(env_name: &str) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file("config.toml"));
    match env_name {
        "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
        "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
        "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
        _ => {}
    }
    figment
        .merge(Env::prefixed("APP_").split("__"))
        .merge(Env::raw().only(&[CREDENTIAL_VAR]).map(|_| "completion.api_key".into()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub completion: CompletionSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be at least 1".to_string()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub pdf_dir: String,
    pub corpus_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            pdf_dir: "./data".to_string(),
            corpus_path: "./parsed_data/law_chunks.json".to_string(),
        }
    }
}

impl DataSettings {
    pub fn pdf_dir(&self) -> PathBuf { expand_path(&self.pdf_dir) }
    pub fn corpus_path(&self) -> PathBuf { expand_path(&self.corpus_path) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub use_fake: bool,
    pub max_len: usize,
    pub dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/all-MiniLM-L6-v2".to_string(),
            use_fake: false,
            max_len: 256,
            dim: 384,
        }
    }
}

impl EmbeddingSettings {
    pub fn model_dir(&self) -> PathBuf { expand_path(&self.model_dir) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { k: 3 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl CompletionSettings {
    /// The configured credential, or `MissingCredential` when it is absent or blank.
    pub fn credential(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::MissingCredential(CREDENTIAL_VAR)),
        }
    }
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
