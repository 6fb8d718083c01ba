//! Database connection pool management.

use bb8::Pool;
use bb8_tiberius::ConnectionManager;
use log::debug;
use std::time::Duration;
use tiberius::Config;

use crate::db::config::{DbAuthMethod, DbConfig};
use crate::db::repository::{RepositoryError, RepositoryResult};

/// Type alias for the database connection pool.
pub type DbPool = Pool<ConnectionManager>;

/// Client type handed out by the pool.
pub type DbClient = tiberius::Client<tokio_util::compat::Compat<tokio::net::TcpStream>>;

/// Build a Tiberius config from the resolved settings.
pub fn build_tiberius_config(config: &DbConfig) -> Config {
    let mut sql_config = Config::new();
    sql_config.host(config.host());
    sql_config.port(config.port);
    sql_config.database(&config.database);
    if let Some(instance) = config.instance_name() {
        sql_config.instance_name(instance);
    }

    match &config.auth_method {
        DbAuthMethod::SqlPassword => {
            sql_config.authentication(tiberius::AuthMethod::sql_server(
                &config.username,
                &config.password,
            ));
        }
        DbAuthMethod::AadToken(token) => {
            sql_config.authentication(tiberius::AuthMethod::aad_token(token));
        }
    }

    sql_config.encryption(tiberius::EncryptionLevel::Required);

    if config.trust_cert {
        sql_config.trust_cert();
    }

    sql_config
}

/// Create a connection pool for `config`.
///
/// No connection is opened here; the first checkout (normally the health
/// check) surfaces connectivity problems.
///
/// # Errors
/// Common errors on checkout:
/// - "Timed out in bb8": Firewall blocking connection or server unreachable
/// - "Login failed": Invalid credentials
/// - "Cannot open server": Server name incorrect or firewall blocking
pub async fn create_pool(config: &DbConfig) -> RepositoryResult<DbPool> {
    let manager = ConnectionManager::new(build_tiberius_config(config));

    debug!(
        "Creating SQL Server pool for {}:{} ({} connections)",
        config.host(),
        config.port,
        config.max_connections
    );

    Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build(manager)
        .await
        .map_err(|e| {
            RepositoryError::ConnectionError(format!("Failed to create connection pool: {}", e))
        })
}

/// Turn a checkout failure into a connection error with a hint on timeouts.
pub(crate) fn checkout_error(err: impl std::fmt::Display) -> RepositoryError {
    let err_msg = format!("Failed to get database connection: {}", err);
    if err_msg.to_lowercase().contains("timed out") {
        RepositoryError::ConnectionError(format!(
            "{}\n\nPossible causes: firewall blocking the SQL Server port, wrong hostname, or invalid credentials.",
            err_msg
        ))
    } else {
        RepositoryError::ConnectionError(err_msg)
    }
}
