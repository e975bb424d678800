use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use std::fs;

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Server name must not be empty"))]
    EmptyServer,

    #[snafu(display("Database name must not be empty"))]
    EmptyDatabase,

    #[snafu(display("Failed to read config file: {}", source))]
    FileRead { source: std::io::Error },

    #[snafu(display("Failed to parse YAML config: {}", source))]
    YamlParse { source: serde_yaml::Error },

    #[snafu(display("Invalid port in server address: {}", address))]
    InvalidPort { address: String },
}

type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Connection settings for one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    /// Builds a validated config. Server and database are trimmed; an empty
    /// or whitespace-only value is rejected before any connection attempt.
    pub fn new(server: &str, database: &str, username: &str, password: &str) -> Result<Self> {
        let server = server.trim();
        if server.is_empty() {
            return EmptyServerSnafu.fail();
        }

        let database = database.trim();
        if database.is_empty() {
            return EmptyDatabaseSnafu.fail();
        }

        Ok(Self {
            server: server.to_string(),
            database: database.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn from_config_file(path: &str) -> Result<Vec<Self>> {
        let content = fs::read_to_string(path).context(FileReadSnafu)?;
        let configs: Vec<DbConfig> = serde_yaml::from_str(&content).context(YamlParseSnafu)?;
        configs
            .into_iter()
            .map(|c| DbConfig::new(&c.server, &c.database, &c.username, &c.password))
            .collect()
    }

    pub fn server_addr(&self) -> Result<ServerAddr> {
        ServerAddr::from_string(&self.server)
    }
}

pub const DEFAULT_PORT: u16 = 1433;

/// A parsed SQL Server address. Accepts the forms SSMS users type:
/// `host`, `host,port`, and `host\instance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAddr {
    Tcp { host: String, port: u16 },
    NamedInstance { host: String, instance: String },
}

impl ServerAddr {
    pub fn from_string(server: &str) -> Result<Self> {
        if let Some((host, instance)) = server.split_once('\\') {
            return Ok(ServerAddr::NamedInstance {
                host: normalize_host(host),
                instance: instance.trim().to_string(),
            });
        }

        if let Some((host, port)) = server.split_once(',') {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort {
                    address: server.to_string(),
                })?;
            return Ok(ServerAddr::Tcp {
                host: normalize_host(host),
                port,
            });
        }

        Ok(ServerAddr::Tcp {
            host: normalize_host(server),
            port: DEFAULT_PORT,
        })
    }
}

/// `.` and `(local)` are SSMS shorthands for the local machine.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host == "." || host.eq_ignore_ascii_case("(local)") {
        "localhost".to_string()
    } else {
        host.to_string()
    }
}
