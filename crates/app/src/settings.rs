use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/billfold.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend base URL; `bills/` is resolved relative to it.
    pub base_url: String,
    pub log_level: String,
    pub undo_window_secs: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            log_level: "info".to_string(),
            undo_window_secs: engine::DEFAULT_UNDO_WINDOW_SECS,
        }
    }
}

/// Loads the TOML config (optional), then `BILLFOLD_*` env vars, then CLI
/// overrides, in that precedence order.
pub fn load(config_path: Option<&str>, base_url: Option<String>) -> Result<Settings> {
    let config_path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BILLFOLD"));
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(base_url) = base_url {
        settings.base_url = base_url;
    }

    Ok(settings)
}
