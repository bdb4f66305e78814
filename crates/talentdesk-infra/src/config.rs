//! Configuration loader for Talentdesk.
//!
//! Reads `config.toml` from the data directory (`~/.talentdesk/` in
//! production) and deserializes it into [`AppConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use talentdesk_types::config::AppConfig;

/// Resolve the data directory from `TALENTDESK_DATA_DIR`, falling back
/// to `~/.talentdesk`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var("TALENTDESK_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".talentdesk")
        }
    }
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns
///   the default.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.resilience.max_retries, 4);
        assert_eq!(config.resilience.max_failures, 8);
    }

    #[tokio::test]
    async fn test_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[resilience]
max_failures = 5
reset_timeout_secs = 300

[gateway]
base_url = "http://agent.internal:9000"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.resilience.max_failures, 5);
        assert_eq!(config.resilience.reset_timeout_secs, 300);
        assert_eq!(config.gateway.base_url, "http://agent.internal:9000");
        // Unspecified fields keep their defaults.
        assert_eq!(config.resilience.base_delay_ms, 1500);
    }

    #[tokio::test]
    async fn test_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.resilience.max_retries, 4);
    }
}
