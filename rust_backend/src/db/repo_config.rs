//! Configuration file support.
//!
//! Settings are read from a TOML file (`job_overlap.toml` by default). Every
//! section is optional; command-line arguments and environment variables are
//! layered on top by [`crate::config::RunConfig`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::config::DbConfig;
use super::repository::RepositoryError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "job_overlap.toml";

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub source: Option<SourceSettings>,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub sink: SinkSettings,
    #[serde(default)]
    pub connection_pool: ConnectionPoolSettings,
}

/// Where job history is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// SQL Server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub auth_method: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_trust_cert")]
    pub trust_cert: bool,
}

/// Where delays are written and how history is queried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSettings {
    #[serde(default = "default_target_table")]
    pub target_table: String,
    #[serde(default = "default_history_procedure")]
    pub history_procedure: String,
}

/// Connection pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionPoolSettings {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

fn default_port() -> u16 {
    1433
}

fn default_trust_cert() -> bool {
    true
}

fn default_target_table() -> String {
    "dbo.JobDelays".to_string()
}

fn default_history_procedure() -> String {
    "GetJobData".to_string()
}

fn default_max_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            server: String::new(),
            database: String::new(),
            auth_method: String::new(),
            username: String::new(),
            password: String::new(),
            access_token: String::new(),
            port: default_port(),
            trust_cert: default_trust_cert(),
        }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            target_table: default_target_table(),
            history_procedure: default_history_procedure(),
        }
    }
}

impl Default for ConnectionPoolSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl DatabaseSettings {
    /// Overlay values from a variable lookup (normally the process
    /// environment). Unset or unparseable variables leave the field alone.
    ///
    /// # Variables
    /// - `DB_SERVER`, `DB_DATABASE`, `DB_USERNAME`, `DB_PASSWORD`
    /// - `DB_PORT`, `DB_TRUST_CERT`
    /// - `DB_AUTH_METHOD`: `sql_password` | `aad_token`
    /// - `DB_ACCESS_TOKEN`: required when `DB_AUTH_METHOD=aad_token`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let text_vars: [(&str, &mut String); 6] = [
            ("DB_SERVER", &mut self.server),
            ("DB_DATABASE", &mut self.database),
            ("DB_USERNAME", &mut self.username),
            ("DB_PASSWORD", &mut self.password),
            ("DB_AUTH_METHOD", &mut self.auth_method),
            ("DB_ACCESS_TOKEN", &mut self.access_token),
        ];
        for (name, field) in text_vars {
            if let Some(value) = lookup(name) {
                *field = value;
            }
        }

        if let Some(port) = lookup("DB_PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Some(trust) = lookup("DB_TRUST_CERT").and_then(|v| v.parse().ok()) {
            self.trust_cert = trust;
        }
    }

    /// True once a server has been named by any source.
    pub fn is_configured(&self) -> bool {
        !self.server.trim().is_empty()
    }
}

impl RepositoryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(RepositoryConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::ConfigurationError(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from the default location if one exists.
    ///
    /// Searches for `job_overlap.toml` in the current directory, then in
    /// `rust_backend/`. Returns `Ok(None)` when neither exists.
    pub fn from_default_location() -> Result<Option<Self>, RepositoryError> {
        let search_paths = [
            PathBuf::from(DEFAULT_CONFIG_FILE),
            PathBuf::from("rust_backend").join(DEFAULT_CONFIG_FILE),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Build a [`DbConfig`] from the database, sink and pool sections.
    ///
    /// # Returns
    /// * `Ok(None)` if no server is configured
    /// * `Ok(Some(DbConfig))` if the settings are complete
    /// * `Err(RepositoryError)` if a server is set but other settings are invalid
    pub fn to_db_config(&self) -> Result<Option<DbConfig>, RepositoryError> {
        if !self.database.is_configured() {
            return Ok(None);
        }
        DbConfig::from_settings(&self.database, &self.sink, &self.connection_pool).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::config::DbAuthMethod;
    use std::collections::HashMap;

    #[test]
    fn test_parse_csv_config() {
        let toml = r#"
[source]
type = "csv"
path = "history.csv"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        let source = config.source.as_ref().unwrap();
        assert_eq!(source.source_type, "csv");
        assert_eq!(source.path.as_deref(), Some(Path::new("history.csv")));
        assert!(config.to_db_config().unwrap().is_none());
        assert_eq!(config.sink.target_table, "dbo.JobDelays");
    }

    #[test]
    fn test_parse_sql_config() {
        let toml = r#"
[source]
type = "sql"

[database]
server = "sql01.corp.local"
database = "msdb"
username = "overlap"
password = "secret"
port = 14330

[sink]
target_table = "dbo.AgentJobDelays"

[connection_pool]
max_connections = 4
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        let db_config = config.to_db_config().unwrap().unwrap();
        assert_eq!(db_config.server, "sql01.corp.local");
        assert_eq!(db_config.port, 14330);
        assert!(db_config.trust_cert);
        assert!(matches!(db_config.auth_method, DbAuthMethod::SqlPassword));
        assert_eq!(db_config.target_table, "dbo.AgentJobDelays");
        assert_eq!(db_config.history_procedure, "GetJobData");
        assert_eq!(db_config.max_connections, 4);
    }

    #[test]
    fn test_sql_auth_requires_credentials() {
        let toml = r#"
[database]
server = "sql01"
database = "msdb"
auth_method = "sql"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert!(config.to_db_config().is_err());
    }

    #[test]
    fn test_server_requires_database_name() {
        let toml = r#"
[database]
server = "sql01"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert!(config.to_db_config().is_err());
    }

    #[test]
    fn test_token_auth() {
        let toml = r#"
[database]
server = "sql01"
database = "msdb"
auth_method = "aad_token"
access_token = "eyJ0"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        let db_config = config.to_db_config().unwrap().unwrap();
        assert!(matches!(db_config.auth_method, DbAuthMethod::AadToken(ref t) if t == "eyJ0"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DB_SERVER", "sql02"),
            ("DB_PORT", "1500"),
            ("DB_TRUST_CERT", "false"),
            ("DB_PASSWORD", "from-env"),
        ]
        .into_iter()
        .collect();

        let mut settings = DatabaseSettings {
            server: "sql01".to_string(),
            password: "from-file".to_string(),
            username: "overlap".to_string(),
            ..Default::default()
        };
        settings.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.server, "sql02");
        assert_eq!(settings.port, 1500);
        assert!(!settings.trust_cert);
        assert_eq!(settings.password, "from-env");
        assert_eq!(settings.username, "overlap");
    }

    #[test]
    fn test_from_file_missing() {
        let result = RepositoryConfig::from_file("/nonexistent/job_overlap.toml");
        assert!(matches!(result, Err(RepositoryError::ConfigurationError(_))));
    }
}
