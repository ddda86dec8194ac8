//! Config loader — reads `~/.wabridge/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.wabridge/config.json`
//! 3. Environment variables `WABRIDGE_<SECTION>__<FIELD>` (override JSON)
//!
//! A missing or unparsable file is never fatal — the bridge starts with
//! defaults and logs what happened.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `WABRIDGE_<SECTION>__<FIELD>` (double underscore as
/// delimiter):
/// - `WABRIDGE_SERVER__HOST` → `server.host`
/// - `WABRIDGE_SERVER__PORT` → `server.port`
/// - `WABRIDGE_ENGINE__COMMAND` → `engine.command`
/// - `WABRIDGE_ENGINE__DATA_PATH` → `engine.data_path`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("WABRIDGE_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("WABRIDGE_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }
    if let Ok(val) = std::env::var("WABRIDGE_ENGINE__COMMAND") {
        config.engine.command = val;
    }
    if let Ok(val) = std::env::var("WABRIDGE_ENGINE__DATA_PATH") {
        config.engine.data_path = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
    use tempfile::NamedTempFile;

    /// Env vars are process-global; serialize every test in this module so
    /// the override tests can't bleed into the load tests.
    fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let _guard = env_lock();
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.engine.command, "node");
    }

    #[test]
    fn test_load_valid_json() {
        let _guard = env_lock();
        let file = write_temp_json(
            r#"{
            "server": {"host": "127.0.0.1", "port": 3100},
            "engine": {"dataPath": "/srv/wa-session"}
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3100);
        assert_eq!(config.engine.data_path, "/srv/wa-session");
        // Default preserved
        assert_eq!(config.engine.command, "node");
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let _guard = env_lock();
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_empty_json() {
        let _guard = env_lock();
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.server.port = 3999;
        config.engine.args = vec!["bridge-runner.js".into()];

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.server.port, 3999);
        assert_eq!(reloaded.engine.args, vec!["bridge-runner.js"]);
    }

    #[test]
    fn test_env_override_port() {
        let _guard = env_lock();
        std::env::set_var("WABRIDGE_SERVER__PORT", "4000");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.server.port, 4000);

        // A non-numeric value is ignored, not an error.
        std::env::set_var("WABRIDGE_SERVER__PORT", "not-a-port");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.server.port, 3000);

        std::env::remove_var("WABRIDGE_SERVER__PORT");
    }

    #[test]
    fn test_env_override_data_path() {
        let _guard = env_lock();
        std::env::set_var("WABRIDGE_ENGINE__DATA_PATH", "/tmp/wa");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.engine.data_path, "/tmp/wa");
        std::env::remove_var("WABRIDGE_ENGINE__DATA_PATH");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let _guard = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["engine"].get("dataPath").is_some());
        assert!(raw["engine"].get("data_path").is_none());
    }
}
