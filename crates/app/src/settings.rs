//! Application settings.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! overridden by `FISCAL__`-prefixed environment variables, e.g.
//! `FISCAL__SERVER__PORT=8000` or `FISCAL__SERVER__SECRET_KEY=...`.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 8000
//! database = { sqlite = "fiscal.db" }
//! prefix = "/api/v1"
//! public_url = "https://receipts.example"
//! secret_key = "change-me"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Defaults to `http://<bind>:<port>`.
    pub public_url: Option<String>,
    pub secret_key: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    #[serde(default = "default_refresh_token_minutes")]
    pub refresh_token_minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_prefix() -> String {
    "/api/v1".to_string()
}

fn default_access_token_minutes() -> i64 {
    5
}

fn default_refresh_token_minutes() -> i64 {
    60
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("FISCAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn server_defaults_are_filled_in() {
        let settings = parse(
            r#"
            [server]
            port = 8000
            database = "memory"
            secret_key = "s"
            "#,
        );
        assert_eq!(settings.app.level, "info");
        let server = settings.server.unwrap();
        assert!(matches!(server.database, Database::Memory));
        assert_eq!(server.prefix, "/api/v1");
        assert_eq!(server.access_token_minutes, 5);
        assert_eq!(server.refresh_token_minutes, 60);
        assert!(server.public_url.is_none());
    }

    #[test]
    fn sqlite_database_takes_a_path() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 8000
            database = { sqlite = "fiscal.db" }
            secret_key = "s"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert!(matches!(
            settings.server.unwrap().database,
            Database::Sqlite(path) if path == "fiscal.db"
        ));
    }

    #[test]
    fn server_section_is_optional() {
        assert!(parse("").server.is_none());
    }
}
