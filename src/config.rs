//! Application configuration.
//!
//! Each value resolves with priority: config.toml > environment > default.

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    server: Option<ServerConfig>,
    content: Option<ContentConfig>,
    database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    port: Option<u16>,
    /// Path prefix the app is served under, e.g. "/kurs". Stripped from
    /// lesson paths when deriving exercise identity.
    base_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentConfig {
    course_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub course_dir: PathBuf,
    pub database_path: PathBuf,
    pub base_path: String,
    pub port: u16,
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", SERVER_ADDR, self.port)
    }
}

/// Load settings with priority: config.toml > .env / environment > default.
pub fn load_settings() -> Settings {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = read_config_file().unwrap_or_default();

    let course_dir = file
        .content
        .as_ref()
        .and_then(|c| c.course_dir.clone())
        .or_else(|| std::env::var("COURSE_DIR").ok())
        .unwrap_or_else(|| "content".to_string());

    let database_path = file
        .database
        .as_ref()
        .and_then(|d| d.path.clone())
        .or_else(|| std::env::var("DATABASE_PATH").ok())
        .unwrap_or_else(|| "data/progress.db".to_string());

    let base_path = file
        .server
        .as_ref()
        .and_then(|s| s.base_path.clone())
        .or_else(|| std::env::var("BASE_PATH").ok())
        .unwrap_or_default();

    let port = file
        .server
        .as_ref()
        .and_then(|s| s.port)
        .or_else(|| {
            std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
        })
        .unwrap_or(3000);

    let settings = Settings {
        course_dir: PathBuf::from(course_dir),
        database_path: PathBuf::from(database_path),
        base_path,
        port,
    };
    tracing::info!(
        "course_dir={} database={} base_path={:?} port={}",
        settings.course_dir.display(),
        settings.database_path.display(),
        settings.base_path,
        settings.port
    );
    settings
}

fn read_config_file() -> Option<AppConfig> {
    let contents = std::fs::read_to_string("config.toml").ok()?;
    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("config.toml: {}", e);
            None
        }
    }
}
