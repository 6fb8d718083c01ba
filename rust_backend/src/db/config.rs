//! Database configuration and environment variable handling.

use super::repo_config::{ConnectionPoolSettings, DatabaseSettings, SinkSettings};
use super::repository::{RepositoryError, RepositoryResult};

/// Environment variable overriding the delay table name.
pub const TARGET_TABLE_ENV: &str = "JOB_OVERLAP_TARGET_TABLE";

/// Authentication method to use when connecting to SQL Server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbAuthMethod {
    /// Traditional SQL Server username/password authentication.
    SqlPassword,
    /// Pre-acquired Azure AD access token.
    AadToken(String),
}

/// Resolved SQL Server connection and object settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQL Server hostname (an instance name may follow a backslash)
    pub server: String,
    /// Database name
    pub database: String,
    /// Username for SQL authentication
    pub username: String,
    /// Password for SQL authentication
    pub password: String,
    /// SQL Server port (default: 1433)
    pub port: u16,
    /// Whether to trust the server certificate
    pub trust_cert: bool,
    /// Authentication strategy
    pub auth_method: DbAuthMethod,
    /// Table receiving `(job_name, delay_sec)` rows
    pub target_table: String,
    /// Stored procedure returning job history
    pub history_procedure: String,
    /// Pool size
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl DbConfig {
    /// Build and validate a configuration from loaded settings.
    pub fn from_settings(
        database: &DatabaseSettings,
        sink: &SinkSettings,
        pool: &ConnectionPoolSettings,
    ) -> RepositoryResult<Self> {
        if !database.is_configured() {
            return Err(RepositoryError::ConfigurationError(
                "SQL Server connection requires a server name".to_string(),
            ));
        }
        if database.database.trim().is_empty() {
            return Err(RepositoryError::ConfigurationError(
                "SQL Server connection requires a database name".to_string(),
            ));
        }

        let auth_method = match database.auth_method.to_lowercase().as_str() {
            "" | "sql" | "sql_password" => {
                if database.username.is_empty() || database.password.is_empty() {
                    return Err(RepositoryError::ConfigurationError(
                        "SQL auth requires a username and password".to_string(),
                    ));
                }
                DbAuthMethod::SqlPassword
            }
            "aad_token" | "access_token" => {
                if database.access_token.is_empty() {
                    return Err(RepositoryError::ConfigurationError(
                        "aad_token auth requires an access token (DB_ACCESS_TOKEN)".to_string(),
                    ));
                }
                DbAuthMethod::AadToken(database.access_token.clone())
            }
            other => {
                return Err(RepositoryError::ConfigurationError(format!(
                    "Unsupported auth method '{}'. Use sql_password or aad_token.",
                    other
                )))
            }
        };

        // Reject bad object names before any connection is attempted.
        quote_object_name(&sink.target_table)?;
        quote_object_name(&sink.history_procedure)?;

        Ok(Self {
            server: database.server.trim().to_string(),
            database: database.database.trim().to_string(),
            username: database.username.clone(),
            password: database.password.clone(),
            port: database.port,
            trust_cert: database.trust_cert,
            auth_method,
            target_table: sink.target_table.clone(),
            history_procedure: sink.history_procedure.clone(),
            max_connections: pool.max_connections.max(1),
            connect_timeout_secs: pool.connect_timeout,
        })
    }

    /// Host part of `server`, without any `\INSTANCE` suffix.
    pub fn host(&self) -> &str {
        self.server
            .split_once('\\')
            .map_or(self.server.as_str(), |(host, _)| host)
    }

    /// Named instance from a `HOST\INSTANCE` server string.
    pub fn instance_name(&self) -> Option<&str> {
        self.server
            .split_once('\\')
            .map(|(_, instance)| instance)
            .filter(|instance| !instance.is_empty())
    }

    /// Bracket-quoted target table, e.g. `[dbo].[JobDelays]`.
    pub fn quoted_target_table(&self) -> RepositoryResult<String> {
        quote_object_name(&self.target_table)
    }

    /// Bracket-quoted history procedure.
    pub fn quoted_history_procedure(&self) -> RepositoryResult<String> {
        quote_object_name(&self.history_procedure)
    }
}

/// Validate a one or two part object name and return it bracket-quoted.
///
/// Only letters, digits, `_`, `@`, `#` and `$` are accepted in each part, so
/// the result can be spliced into SQL text.
pub fn quote_object_name(name: &str) -> RepositoryResult<String> {
    let parts: Vec<&str> = name.trim().split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(RepositoryError::ValidationError(format!(
            "Invalid object name '{}': expected NAME or SCHEMA.NAME",
            name
        )));
    }

    let mut quoted = Vec::with_capacity(parts.len());
    for part in parts {
        let part = part.trim_start_matches('[').trim_end_matches(']');
        let valid = !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '#' | '$'));
        if !valid {
            return Err(RepositoryError::ValidationError(format!(
                "Invalid object name '{}'",
                name
            )));
        }
        quoted.push(format!("[{}]", part));
    }
    Ok(quoted.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            server: "sql01\\AGENT".to_string(),
            database: "msdb".to_string(),
            username: "overlap".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_quote_object_name() {
        assert_eq!(quote_object_name("dbo.JobDelays").unwrap(), "[dbo].[JobDelays]");
        assert_eq!(quote_object_name("GetJobData").unwrap(), "[GetJobData]");
        assert_eq!(quote_object_name("[dbo].[Job_Delays]").unwrap(), "[dbo].[Job_Delays]");
    }

    #[test]
    fn test_quote_object_name_rejects_injection() {
        assert!(quote_object_name("JobDelays; DROP TABLE x").is_err());
        assert!(quote_object_name("a.b.c.d").is_err());
        assert!(quote_object_name("").is_err());
        assert!(quote_object_name("dbo.").is_err());
        assert!(matches!(
            quote_object_name("a.b.c"),
            Err(RepositoryError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_settings_splits_instance() {
        let config = DbConfig::from_settings(
            &settings(),
            &SinkSettings::default(),
            &ConnectionPoolSettings::default(),
        )
        .unwrap();

        assert_eq!(config.host(), "sql01");
        assert_eq!(config.instance_name(), Some("AGENT"));
        assert_eq!(config.quoted_target_table().unwrap(), "[dbo].[JobDelays]");
        assert_eq!(config.quoted_history_procedure().unwrap(), "[GetJobData]");
    }

    #[test]
    fn test_from_settings_plain_host() {
        let mut db = settings();
        db.server = "sql01".to_string();
        let config =
            DbConfig::from_settings(&db, &SinkSettings::default(), &ConnectionPoolSettings::default())
                .unwrap();
        assert_eq!(config.host(), "sql01");
        assert_eq!(config.instance_name(), None);
    }

    #[test]
    fn test_from_settings_rejects_bad_table() {
        let sink = SinkSettings {
            target_table: "dbo.Job Delays".to_string(),
            ..Default::default()
        };
        let result = DbConfig::from_settings(&settings(), &sink, &ConnectionPoolSettings::default());
        assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
    }

    #[test]
    fn test_from_settings_unknown_auth() {
        let mut db = settings();
        db.auth_method = "kerberos".to_string();
        let result =
            DbConfig::from_settings(&db, &SinkSettings::default(), &ConnectionPoolSettings::default());
        assert!(result.is_err());
    }
}
