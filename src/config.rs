//! Layered configuration.
//!
//! Settings are merged from, in increasing priority:
//! - built-in defaults
//! - `.symdex/settings.toml`, found by walking up from the current directory
//! - environment variables
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SYMDEX_` and use double
//! underscores to separate nested levels:
//! - `SYMDEX_RANK__ALPHA=0.5` sets `rank.alpha`
//! - `SYMDEX_INDEX__INDEX_PATH=out/index.scip` sets `index.index_path`
//! - `SYMDEX_SEMANTIC__NORM=softmax` sets `semantic.norm`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::rank::{DEFAULT_ALPHA, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, DEFAULT_WEIGHT_KEY};
use crate::search::DEFAULT_Z_SCORE_POWER;
use crate::semantic::NormType;

const CONFIG_DIR: &str = ".symdex";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SYMDEX_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub index: IndexSettings,

    #[serde(default)]
    pub rank: RankSettings,

    #[serde(default)]
    pub semantic: SemanticSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexSettings {
    /// Binary SCIP index to load
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Where module sources live when the index does not embed their text.
    /// Falls back to the root recorded in the index metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    /// Emit caller/callee edges while building the graph
    #[serde(default = "default_true")]
    pub build_caller_relations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RankSettings {
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Edge attribute read as the transition weight
    #[serde(default = "default_weight_key")]
    pub weight_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SemanticSettings {
    #[serde(default)]
    pub norm: NormType,

    /// Exponent applied after the shifted z-score
    #[serde(default = "default_z_score_power")]
    pub z_score_power: f64,

    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: PathBuf,

    /// Embedding model name (used with the `fastembed` feature)
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for every target without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `graph = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_index_path() -> PathBuf {
    PathBuf::from("index.scip")
}
fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}
fn default_weight_key() -> String {
    DEFAULT_WEIGHT_KEY.to_string()
}
fn default_z_score_power() -> f64 {
    DEFAULT_Z_SCORE_POWER
}
fn default_embeddings_path() -> PathBuf {
    PathBuf::from(".symdex/embeddings.json")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index: IndexSettings::default(),
            rank: RankSettings::default(),
            semantic: SemanticSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            project_root: None,
            build_caller_relations: true,
        }
    }
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            weight_key: default_weight_key(),
        }
    }
}

impl Default for SemanticSettings {
    fn default() -> Self {
        Self {
            norm: NormType::default(),
            z_score_power: default_z_score_power(),
            embeddings_path: default_embeddings_path(),
            model: default_embedding_model(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting; single underscores stay in names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.symdex/settings.toml` in the current directory or an ancestor
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Directory containing `.symdex`, searching upwards from the current directory
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write default settings to `<dir>/.symdex/settings.toml`
    pub fn init_config_file(
        dir: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
