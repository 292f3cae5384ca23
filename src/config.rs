//! Environment-first configuration with an optional YAML overlay.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

use crate::models::{is_known_model, MODELS};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Be helpful, accurate, and concise. Provide sources when possible.";

/// Resolved application configuration. The exchange core only ever reads
/// from this; command handlers may mutate the search filters and prompt.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,

    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,

    pub search_mode: String,
    pub search_recency_filter: Option<String>,
    pub search_domain_filter: Vec<String>,
    pub search_context_size: String,
    pub return_citations: bool,
    pub return_related_questions: bool,
    pub return_images: bool,

    pub system_prompt: String,

    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub export_dir: PathBuf,

    pub show_cost: bool,
    pub show_citations: bool,
    pub show_related: bool,
}

/// Partial settings read from the YAML config file; every field optional so
/// the file may override any subset.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
    api_key: Option<String>,
    base_url: Option<String>,
    default_model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    top_p: Option<f64>,
    search_mode: Option<String>,
    search_recency_filter: Option<String>,
    search_domain_filter: Option<Vec<String>>,
    search_context_size: Option<String>,
    return_citations: Option<bool>,
    return_related_questions: Option<bool>,
    return_images: Option<bool>,
    system_prompt: Option<String>,
    db_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    show_cost: Option<bool>,
    show_citations: Option<bool>,
    show_related: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            default_model: "sonar".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
            top_p: 0.9,
            search_mode: "web".to_string(),
            search_recency_filter: None,
            search_domain_filter: Vec::new(),
            search_context_size: "medium".to_string(),
            return_citations: true,
            return_related_questions: true,
            return_images: false,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            db_path: transcript_store::default_db_path(),
            log_path: transcript_store::data_root().join("sonar-chat.log"),
            export_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Desktop"),
            show_cost: true,
            show_citations: true,
            show_related: true,
        }
    }
}

impl AppConfig {
    /// Defaults, then environment, then the YAML overlay file.
    pub fn load() -> Result<Self, String> {
        let mut config = Self::default();
        config.apply_env();

        if let Some(path) = config_file_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(raw) => match serde_yaml::from_str::<ConfigOverlay>(&raw) {
                        Ok(overlay) => config.apply_overlay(overlay),
                        Err(error) => {
                            warn!(path = %path.display(), %error, "invalid YAML config, using defaults");
                        }
                    },
                    Err(error) => {
                        warn!(path = %path.display(), %error, "cannot read config file, using defaults");
                    }
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(value) = env_string_opt("SONAR_API_KEY") {
            self.api_key = value;
        }
        if let Some(value) = env_string_opt("SONAR_BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = env_string_opt("SONAR_DEFAULT_MODEL") {
            self.default_model = value;
        }
        if let Some(value) = env_string_opt("SONAR_SYSTEM_PROMPT") {
            self.system_prompt = value;
        }
        if let Some(value) = env_string_opt("SONAR_DB_PATH") {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = env_string_opt("SONAR_LOG_PATH") {
            self.log_path = PathBuf::from(value);
        }
        if let Some(value) = env_string_opt("SONAR_EXPORT_DIR") {
            self.export_dir = PathBuf::from(value);
        }
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        macro_rules! take {
            ($field:ident) => {
                if let Some(value) = overlay.$field {
                    self.$field = value;
                }
            };
        }

        take!(api_key);
        take!(base_url);
        take!(default_model);
        take!(temperature);
        take!(max_tokens);
        take!(top_p);
        take!(search_mode);
        take!(search_context_size);
        take!(return_citations);
        take!(return_related_questions);
        take!(return_images);
        take!(system_prompt);
        take!(db_path);
        take!(log_path);
        take!(export_dir);
        take!(show_cost);
        take!(show_citations);
        take!(show_related);
        if let Some(value) = overlay.search_recency_filter {
            self.search_recency_filter = Some(value);
        }
        if let Some(value) = overlay.search_domain_filter {
            self.search_domain_filter = value;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err(
                "No API key configured. Set SONAR_API_KEY or add api_key to the config file."
                    .to_string(),
            );
        }

        if !is_known_model(&self.default_model) {
            let valid: Vec<&str> = MODELS.iter().map(|model| model.id).collect();
            return Err(format!(
                "Unknown model '{}'. Valid models: {}",
                self.default_model,
                valid.join(", ")
            ));
        }

        Ok(())
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env_string_opt("SONAR_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("sonar-chat").join("config.yaml"))
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
