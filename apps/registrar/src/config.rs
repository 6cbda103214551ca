use std::{collections::HashMap, fs, time::Duration};

pub const SETTINGS_FILE: &str = "registrar.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Serves `/basicInfo` and `/departments`.
    pub api_url: String,
    /// Serves `/details` and `/locations`. Falls back to `api_url`.
    pub details_api_url: Option<String>,
    pub draft_database_url: String,
    pub search_debounce_ms: u64,
    pub autosave_delay_ms: u64,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:4001".into(),
            details_api_url: None,
            draft_database_url: "sqlite://./data/registrar.db".into(),
            search_debounce_ms: 500,
            autosave_delay_ms: 2_000,
            page_size: 10,
        }
    }
}

impl Settings {
    pub fn details_api_url(&self) -> &str {
        self.details_api_url.as_deref().unwrap_or(&self.api_url)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the flat `registrar.toml` map, then environment variables.
pub fn resolve_settings(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("api_url") {
                settings.api_url = v.clone();
            }
            if let Some(v) = file_cfg.get("details_api_url") {
                settings.details_api_url = Some(v.clone());
            }
            if let Some(v) = file_cfg.get("draft_database_url") {
                settings.draft_database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("search_debounce_ms").and_then(|v| v.parse().ok()) {
                settings.search_debounce_ms = v;
            }
            if let Some(v) = file_cfg.get("autosave_delay_ms").and_then(|v| v.parse().ok()) {
                settings.autosave_delay_ms = v;
            }
            if let Some(v) = file_cfg.get("page_size").and_then(|v| v.parse().ok()) {
                settings.page_size = v;
            }
        }
    }

    if let Some(v) = env("REGISTRAR_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__DETAILS_API_URL") {
        settings.details_api_url = Some(v);
    }

    if let Some(v) = env("APP__DRAFT_DATABASE_URL") {
        settings.draft_database_url = v;
    }

    if let Some(v) = env("APP__SEARCH_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = env("APP__AUTOSAVE_DELAY_MS").and_then(|v| v.parse().ok()) {
        settings.autosave_delay_ms = v;
    }
    if let Some(v) = env("APP__PAGE_SIZE").and_then(|v| v.parse().ok()) {
        settings.page_size = v;
    }

    settings
}

/// Turns a bare path into a `sqlite://` URL. The store creates missing parent directories.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().draft_database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
