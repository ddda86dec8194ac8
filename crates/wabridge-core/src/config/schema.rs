//! Configuration schema.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case. The file is
//! small on purpose: everything the bridge needs is where to listen and how
//! to start the engine runner.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.wabridge/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// Where the subscriber WebSocket server listens.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

// ─────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────

/// How to start the browser-automation engine runner.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Executable to spawn.
    pub command: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Directory the runner stores its login session in (`WA_DATA_PATH`).
    pub data_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec!["runner.js".to_string()],
            data_path: "~/.wabridge/session".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
