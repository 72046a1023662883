//! Typed, layered configuration.
//!
//! `config/base.yaml` is deep-merged with the optional `config/<env>.yaml`,
//! environment variables override individual connection fields, and
//! `{{env}}` placeholders in the `postgres` and `qdrant` sections are
//! replaced by the environment name before the result is deserialized into
//! [`AppConfig`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::env_config::parse_with_default;
use crate::{
    ConfigError, QueryDefinition, DEFAULT_ANCHOR_TABLE, DEFAULT_COLLECTION, DEFAULT_PLACEHOLDER_LITERAL,
    DEFAULT_SEARCH_LIMIT, DEFAULT_VECTOR_SIZE, NormalizeOptions, PG_POOL_MAX_CONNECTIONS,
};

const ENV_PLACEHOLDER: &str = "{{env}}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_project")]
    pub project_name: String,
    /// Environment the configuration was resolved for; set by the loader.
    #[serde(default)]
    pub environment: String,
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub qdrant: QdrantConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub evidence: EvidenceConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub normalizer: NormalizeOptions,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default = "default_pg_host")]
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub db: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("db", &self.db)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub host: String,
    pub port: u16,
    /// Use `https` for the gRPC endpoint.
    pub tls: bool,
    pub api_key: Option<String>,
    pub collection: String,
    pub vector_size: usize,
}

impl QdrantConfig {
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 6334,
            tls: false,
            api_key: None,
            collection: DEFAULT_COLLECTION.to_owned(),
            vector_size: DEFAULT_VECTOR_SIZE,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API root; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_owned(),
            model: "gemini-2.5-flash".to_owned(),
            api_key: None,
            temperature: 0.4,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Where model weights are cached; the library default when unset.
    pub cache_dir: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model: "BAAI/bge-m3".to_owned(), cache_dir: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    pub anchor_table: String,
    pub placeholder_literal: String,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            anchor_table: DEFAULT_ANCHOR_TABLE.to_owned(),
            placeholder_literal: DEFAULT_PLACEHOLDER_LITERAL.to_owned(),
        }
    }
}

/// How generated SQL referencing relations outside the grounding context is
/// treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingPolicy {
    /// Reject before validation.
    #[default]
    Strict,
    /// Leave it to database permissions.
    Permissive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub grounding_policy: GroundingPolicy,
    pub search_limit: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { grounding_policy: GroundingPolicy::Strict, search_limit: DEFAULT_SEARCH_LIMIT }
    }
}

fn default_project() -> String {
    "eGP".to_owned()
}

fn default_pg_host() -> String {
    "localhost".to_owned()
}

const fn default_pg_port() -> u16 {
    5432
}

const fn default_max_connections() -> u32 {
    PG_POOL_MAX_CONNECTIONS
}

#[derive(Debug, Clone, Copy)]
enum OverrideKind {
    Text,
    Port,
}

/// Environment variables that override single fields, highest priority.
const ENV_OVERRIDES: &[(&str, &str, &str, OverrideKind)] = &[
    ("POSTGRES_HOST", "postgres", "host", OverrideKind::Text),
    ("POSTGRES_PORT", "postgres", "port", OverrideKind::Port),
    ("POSTGRES_USER", "postgres", "user", OverrideKind::Text),
    ("POSTGRES_PASSWORD", "postgres", "password", OverrideKind::Text),
    ("POSTGRES_DB", "postgres", "db", OverrideKind::Text),
    ("QDRANT_HOST", "qdrant", "host", OverrideKind::Text),
    ("QDRANT_PORT", "qdrant", "port", OverrideKind::Port),
    ("QDRANT_API_KEY", "qdrant", "api_key", OverrideKind::Text),
    ("DBSAGE_LLM_URL", "llm", "base_url", OverrideKind::Text),
    ("DBSAGE_LLM_MODEL", "llm", "model", OverrideKind::Text),
    ("DBSAGE_LLM_API_KEY", "llm", "api_key", OverrideKind::Text),
];

/// Load `base.yaml` and `<env>.yaml` from `config_dir` and resolve them for `env`.
pub fn load_config(config_dir: &Path, env: &str) -> Result<AppConfig, ConfigError> {
    let base = read_yaml(&config_dir.join("base.yaml"))?;
    let env_path = config_dir.join(format!("{env}.yaml"));
    let merged = if env_path.exists() { deep_merge(base, read_yaml(&env_path)?) } else { base };
    resolve(merged, env, |key| std::env::var(key).ok())
}

/// Apply overrides, placeholders and the environment name, then deserialize.
pub(crate) fn resolve<F>(mut value: Value, env: &str, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !value.is_mapping() {
        value = Value::Mapping(Mapping::new());
    }
    apply_env_overrides(&mut value, &lookup);
    replace_env_placeholders(&mut value, env);
    if let Value::Mapping(root) = &mut value {
        root.insert(Value::from("environment"), Value::from(env));
    }
    serde_yaml::from_value(value).map_err(ConfigError::Invalid)
}

/// Recursively merge `overlay` into `base`.
///
/// Mappings merge key by key; any other overlay value, including `null`,
/// replaces the base value outright.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        },
        (_, overlay) => overlay,
    }
}

/// Read raw query definitions: a YAML list of `{name, template}` mappings.
pub fn load_query_definitions(path: &Path) -> Result<Vec<QueryDefinition>, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

fn read_yaml(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let value: Value = serde_yaml::from_str(&text)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    Ok(if value.is_null() { Value::Mapping(Mapping::new()) } else { value })
}

fn apply_env_overrides<F>(root: &mut Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let Value::Mapping(root) = root else {
        return;
    };
    for (var, section, key, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else {
            continue;
        };
        let value = match kind {
            OverrideKind::Text => Value::from(raw),
            OverrideKind::Port => {
                let port: u16 = parse_with_default(var, Some(raw), 0);
                if port == 0 {
                    continue;
                }
                Value::from(port)
            },
        };
        let section_value = root
            .entry(Value::from(*section))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !section_value.is_mapping() {
            *section_value = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(section_map) = section_value {
            section_map.insert(Value::from(*key), value);
        }
    }
}

fn replace_env_placeholders(root: &mut Value, env: &str) {
    for section in ["postgres", "qdrant"] {
        if let Some(Value::Mapping(map)) = root.get_mut(section) {
            for (_, value) in map.iter_mut() {
                if let Value::String(s) = value {
                    if s.contains(ENV_PLACEHOLDER) {
                        *s = s.replace(ENV_PLACEHOLDER, env);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
