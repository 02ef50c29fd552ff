mod loader;

pub use loader::{global_config_path, load_config, ConfigLoader};

use serde::{Deserialize, Serialize};

/// Process-level settings for the NotebookLM client.
///
/// Every field is optional so partial sources (file, environment) can be
/// layered with [`Config::merge`]; later sources win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Raw `Cookie` header value copied from an authenticated browser session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    /// Pre-extracted CSRF token (`SNlM0e`). Normally scraped on first use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    /// Pre-extracted session id (`FdrFJe`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Frontend build label override (`bl` query parameter).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_label: Option<String>,
    /// Origin override, mostly for proxies and tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn merge_option_replace<T>(target: &mut Option<T>, source: Option<T>) {
    if source.is_some() {
        *target = source;
    }
}

impl Config {
    pub fn merge(&mut self, other: Config) {
        merge_option_replace(&mut self.cookies, other.cookies);
        merge_option_replace(&mut self.csrf_token, other.csrf_token);
        merge_option_replace(&mut self.session_id, other.session_id);
        merge_option_replace(&mut self.build_label, other.build_label);
        merge_option_replace(&mut self.base_url, other.base_url);
        merge_option_replace(&mut self.debug, other.debug);
        merge_option_replace(&mut self.log_level, other.log_level);
    }

    pub fn cookies(&self) -> &str {
        self.cookies.as_deref().unwrap_or_default()
    }

    pub fn is_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}
