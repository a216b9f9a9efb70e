use std::{collections::HashMap, fs, path::Path, time::Duration};

use client_core::{picker::DEFAULT_MAX_PENDING, BridgeConfig};

pub const SETTINGS_FILE: &str = "listnav.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub page_size: u64,
    pub request_timeout_secs: Option<u64>,
    pub picker_max_pending: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            page_size: 20,
            request_timeout_secs: None,
            picker_max_pending: DEFAULT_MAX_PENDING,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn bridge_config(&self) -> BridgeConfig {
        let config = BridgeConfig::new(self.base_url.clone());
        match self.request_timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

/// Defaults, then `listnav.toml`, then environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(Path::new(SETTINGS_FILE)) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    apply_values(settings, |key| file_cfg.get(key).cloned());
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    apply_values(settings, |key| {
        let upper = key.to_ascii_uppercase();
        lookup(&format!("APP__{upper}")).or_else(|| lookup(&format!("LISTNAV_{upper}")))
    });
}

fn apply_values(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("base_url") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("page_size").and_then(|v| v.parse().ok()) {
        settings.page_size = v;
    }
    if let Some(v) = lookup("request_timeout_secs").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = lookup("picker_max_pending").and_then(|v| v.parse().ok()) {
        settings.picker_max_pending = v;
    }
    if let Some(v) = lookup("log_filter") {
        settings.log_filter = v;
    }
}
