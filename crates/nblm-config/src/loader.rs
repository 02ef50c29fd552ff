use crate::Config;
use anyhow::{Context, Result};
use jsonc_parser::{parse_to_serde_value, ParseOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_COOKIES: &str = "NOTEBOOKLM_COOKIES";
pub const ENV_CSRF_TOKEN: &str = "NOTEBOOKLM_CSRF_TOKEN";
pub const ENV_SESSION_ID: &str = "NOTEBOOKLM_SESSION_ID";
pub const ENV_BUILD_LABEL: &str = "NOTEBOOKLM_BL";
pub const ENV_BASE_URL: &str = "NOTEBOOKLM_BASE_URL";
pub const ENV_DEBUG: &str = "NOTEBOOKLM_DEBUG";
pub const ENV_LOG_LEVEL: &str = "NOTEBOOKLM_LOG_LEVEL";
/// Path of an extra config file, loaded after the global one.
pub const ENV_CONFIG_PATH: &str = "NBLM_CONFIG";

static ENV_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{env:([^}]+)\}").unwrap());

pub struct ConfigLoader {
    config: Config,
    config_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            config_paths: Vec::new(),
        }
    }

    pub fn load_from_str(&mut self, content: &str) -> Result<()> {
        let config = parse_jsonc(content).with_context(|| "Failed to parse config content")?;
        self.config.merge(config);
        Ok(())
    }

    /// Merge a JSONC file. A missing file is not an error.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        // Cookies are secrets; `{env:VAR}` keeps them out of the file.
        let content = substitute_env_vars(&content);

        let config = parse_jsonc(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::debug!(path = %path.display(), "loaded config file");
        self.config.merge(config);
        self.config_paths.push(path.to_path_buf());
        Ok(())
    }

    pub fn load_global(&mut self) -> Result<()> {
        let global = global_config_path();
        for ext in ["jsonc", "json"] {
            let path = global.with_extension(ext);
            if path.exists() {
                self.load_from_file(&path)?;
                break;
            }
        }
        Ok(())
    }

    /// Apply `NOTEBOOKLM_*` variables from the process environment.
    pub fn load_from_env(&mut self) -> Result<()> {
        if let Ok(config_path) = env::var(ENV_CONFIG_PATH) {
            self.load_from_file(&config_path)?;
        }
        self.apply_env(|key| env::var(key).ok());
        Ok(())
    }

    /// Apply environment overrides read through `lookup`. Empty values count
    /// as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        self.config.merge(Config {
            cookies: get(ENV_COOKIES).map(|v| v.trim().to_string()),
            csrf_token: get(ENV_CSRF_TOKEN),
            session_id: get(ENV_SESSION_ID),
            build_label: get(ENV_BUILD_LABEL),
            base_url: get(ENV_BASE_URL),
            debug: get(ENV_DEBUG).map(|_| true),
            log_level: get(ENV_LOG_LEVEL),
        });
    }

    /// Merge order: global file, explicit file, environment.
    pub fn load_all(&mut self, explicit: Option<&Path>) -> Result<Config> {
        self.load_global()?;
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            self.load_from_file(path)?;
        }
        self.load_from_env()?;
        Ok(self.config.clone())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// `~/.config/nblm/config` (extension chosen by the loader).
pub fn global_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("nblm/config")
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    ConfigLoader::new().load_all(explicit)
}

fn substitute_env_vars(text: &str) -> String {
    ENV_REF
        .replace_all(text, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .to_string()
}

fn parse_jsonc(content: &str) -> Result<Config> {
    let parse_options = ParseOptions {
        allow_trailing_commas: true,
        ..Default::default()
    };
    let parsed = parse_to_serde_value(content, &parse_options)
        .with_context(|| "Failed to parse JSONC")?
        .context("Config content is empty")?;
    serde_json::from_value(parsed).with_context(|| "Failed to parse config JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TestDir {
        path: PathBuf,
    }

    impl TestDir {
        fn new(prefix: &str) -> Self {
            let unique = format!(
                "{}_{}_{}",
                prefix,
                std::process::id(),
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("clock error")
                    .as_nanos()
            );
            let path = std::env::temp_dir().join(unique);
            fs::create_dir_all(&path).expect("failed to create test temp dir");
            Self { path }
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_jsonc_with_comments_and_trailing_comma() {
        let content = r#"{
            // copied from the browser
            "cookies": "SID=abc; HSID=def",
            "build_label": "boq_custom",
        }"#;
        let config = parse_jsonc(content).unwrap();
        assert_eq!(config.cookies(), "SID=abc; HSID=def");
        assert_eq!(config.build_label.as_deref(), Some("boq_custom"));
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = TestDir::new("nblm_config_missing");
        let mut loader = ConfigLoader::new();
        loader.load_from_file(dir.path.join("nope.jsonc")).unwrap();
        assert!(loader.config_paths().is_empty());
        assert_eq!(loader.config(), &Config::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TestDir::new("nblm_config_precedence");
        let path = dir.path.join("config.jsonc");
        fs::write(
            &path,
            r#"{"cookies": "SID=file", "build_label": "bl-file", "session_id": "sid-file"}"#,
        )
        .unwrap();

        let mut loader = ConfigLoader::new();
        loader.load_from_file(&path).unwrap();
        loader.apply_env(lookup(&[
            (ENV_COOKIES, "  SID=env  "),
            (ENV_BUILD_LABEL, ""),
            (ENV_DEBUG, "1"),
        ]));

        let config = loader.config();
        assert_eq!(config.cookies(), "SID=env");
        // Empty env values do not clobber the file.
        assert_eq!(config.build_label.as_deref(), Some("bl-file"));
        assert_eq!(config.session_id.as_deref(), Some("sid-file"));
        assert!(config.is_debug());
        assert_eq!(loader.config_paths(), &[path]);
    }

    #[test]
    fn test_env_reference_substitution() {
        std::env::set_var("NBLM_TEST_COOKIE_REF", "SID=from-env");
        let out = substitute_env_vars(r#"{"cookies": "{env:NBLM_TEST_COOKIE_REF}"}"#);
        assert_eq!(out, r#"{"cookies": "SID=from-env"}"#);
        std::env::remove_var("NBLM_TEST_COOKIE_REF");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TestDir::new("nblm_config_explicit");
        let err = ConfigLoader::new()
            .load_all(Some(&dir.path.join("absent.json")))
            .unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let dir = TestDir::new("nblm_config_invalid");
        let path = dir.path.join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = ConfigLoader::new().load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}
