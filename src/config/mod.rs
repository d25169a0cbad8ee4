mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use std::path::Path;
use tracing::{debug, info};

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let config = load_from(&config_path).await?;
    apply_env_overrides(config, |key| env::var(key).ok())
}

/// Reads a YAML config file. A missing file yields the defaults.
pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    match tokio::fs::read_to_string(path).await {
        Ok(config_str) => Ok(serde_yaml::from_str(&config_str)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Layers process environment on top of file configuration.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.llm.api_key = Some(key);
    }

    // Blank keys behave like unset ones.
    config.llm.api_key = config
        .llm
        .api_key
        .take()
        .filter(|key| !key.trim().is_empty());

    if let Some(environment) = lookup("APP_ENV") {
        config.server.environment = environment.parse().map_err(Error::config)?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_from(dir.path().join("absent.yaml")).await.unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.backend, BackendKind::Agent);
        assert_eq!(config.llm.web_search.allowed_domains, vec!["docs.salla.dev"]);
        assert!(config.llm.api_key.is_none());
    }

    #[tokio::test]
    async fn test_partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(
            &path,
            r#"
server:
  port: 9090
  environment: development
llm:
  backend: completion
  model: gpt-4o
"#,
        )
        .await
        .unwrap();

        let config = load_from(&path).await.unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.environment.is_development());
        assert_eq!(config.llm.backend, BackendKind::Completion);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert!(config.llm.code_interpreter);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "server: [not, a, map").await.unwrap();

        assert!(matches!(load_from(&path).await, Err(Error::Yaml(_))));
    }

    #[test]
    fn test_env_key_overrides_file_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("from-file".to_string());

        let config =
            apply_env_overrides(config, lookup_from(&[("OPENAI_API_KEY", "from-env")])).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_blank_key_is_treated_as_missing() {
        let config =
            apply_env_overrides(Config::default(), lookup_from(&[("OPENAI_API_KEY", "  ")]))
                .unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_app_env_selects_environment() {
        let config =
            apply_env_overrides(Config::default(), lookup_from(&[("APP_ENV", "development")]))
                .unwrap();
        assert_eq!(config.server.environment, Environment::Development);

        let result = apply_env_overrides(Config::default(), lookup_from(&[("APP_ENV", "staging")]));
        assert!(result.unwrap_err().to_string().contains("Invalid environment"));
    }
}
