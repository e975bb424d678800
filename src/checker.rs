use crate::analysis::fragmentation;
use crate::config::{DbConfig, ServerAddr};
use crate::models::{AnalysisResults, FragmentationRecord};
use snafu::{ResultExt, Snafu};
use tiberius::{AuthMethod, Client, Config, Row, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

#[derive(Debug, Snafu)]
pub enum CheckerError {
    #[snafu(display("Invalid server address: {}", source))]
    InvalidAddress { source: crate::config::ConfigError },

    #[snafu(display("Failed to connect to {}: {}", server, source))]
    Connect {
        server: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to establish SQL Server session: {}", source))]
    Handshake { source: tiberius::error::Error },

    #[snafu(display("Failed to execute query: {}", source))]
    Query { source: tiberius::error::Error },

    #[snafu(display("Failed to read column {} from result row: {}", column, source))]
    RowDecode {
        column: &'static str,
        source: tiberius::error::Error,
    },
}

type Result<T, E = CheckerError> = std::result::Result<T, E>;

/// Top 30 most fragmented indexes in the current database. LIMITED scan mode
/// keeps the DMV cheap; the ORDER BY puts the worst offenders first so the
/// report needs no re-sort.
const FRAGMENTATION_QUERY: &str = r#"
    SELECT TOP 30
        t.name AS TableName,
        i.name AS IndexName,
        i.type_desc AS IndexType,
        ps.avg_fragmentation_in_percent AS FragmentationPercent,
        ps.page_count AS PageCount
    FROM sys.dm_db_index_physical_stats(DB_ID(), NULL, NULL, NULL, 'LIMITED') AS ps
    JOIN sys.indexes AS i
        ON ps.object_id = i.object_id AND ps.index_id = i.index_id
    JOIN sys.tables AS t
        ON i.object_id = t.object_id
    WHERE ps.database_id = DB_ID()
    ORDER BY ps.avg_fragmentation_in_percent DESC;
"#;

pub struct FragmentationChecker {
    config: DbConfig,
    client: Client<Compat<TcpStream>>,
}

impl FragmentationChecker {
    pub async fn connect(config: DbConfig) -> Result<Self> {
        let addr = config.server_addr().context(InvalidAddressSnafu)?;
        info!("Connecting to SQL Server at {}", config.server);

        let mut tds = Config::new();
        tds.database(&config.database);
        tds.authentication(AuthMethod::sql_server(&config.username, &config.password));
        tds.trust_cert();

        let tcp = match &addr {
            ServerAddr::Tcp { host, port } => {
                tds.host(host);
                tds.port(*port);
                TcpStream::connect(tds.get_addr())
                    .await
                    .context(ConnectSnafu {
                        server: config.server.clone(),
                    })?
            }
            ServerAddr::NamedInstance { host, instance } => {
                tds.host(host);
                tds.instance_name(instance);
                // Named instances resolve their port through the SQL Browser service.
                TcpStream::connect_named(&tds).await.context(HandshakeSnafu)?
            }
        };
        tcp.set_nodelay(true).context(ConnectSnafu {
            server: config.server.clone(),
        })?;

        let client = Client::connect(tds, tcp.compat_write())
            .await
            .context(HandshakeSnafu)?;

        info!("Successfully connected to database: {}", config.database);

        Ok(Self { config, client })
    }

    /// Runs the single reporting pass: fetch, map, aggregate. The connection
    /// closes when the checker drops, success or failure.
    pub async fn analyze(&mut self) -> Result<AnalysisResults> {
        info!(
            "Fetching index fragmentation statistics for {}...",
            self.config.database
        );
        let records = self.fetch_fragmentation_stats().await?;

        let summary = fragmentation::summarize(&records);
        Ok(AnalysisResults { records, summary })
    }

    async fn fetch_fragmentation_stats(&mut self) -> Result<Vec<FragmentationRecord>> {
        let stream = self
            .client
            .query(FRAGMENTATION_QUERY, &[])
            .await
            .context(QuerySnafu)?;
        let rows = stream.into_first_result().await.context(QuerySnafu)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(row)?);
        }

        debug!("Fetched {} fragmentation records", records.len());
        Ok(records)
    }
}

fn record_from_row(row: &Row) -> Result<FragmentationRecord> {
    Ok(coalesce_record(
        row.try_get::<&str, _>("TableName")
            .context(RowDecodeSnafu {
                column: "TableName",
            })?,
        row.try_get::<&str, _>("IndexName")
            .context(RowDecodeSnafu {
                column: "IndexName",
            })?,
        row.try_get::<&str, _>("IndexType")
            .context(RowDecodeSnafu {
                column: "IndexType",
            })?,
        row.try_get::<f64, _>("FragmentationPercent")
            .context(RowDecodeSnafu {
                column: "FragmentationPercent",
            })?,
        row.try_get::<i64, _>("PageCount").context(RowDecodeSnafu {
            column: "PageCount",
        })?,
    ))
}

/// Null coalescing per column: a heap has no index name, so a null IndexName
/// becomes the literal "NULL"; null metrics read as 0.
fn coalesce_record(
    table_name: Option<&str>,
    index_name: Option<&str>,
    index_type: Option<&str>,
    fragmentation_percent: Option<f64>,
    page_count: Option<i64>,
) -> FragmentationRecord {
    FragmentationRecord {
        table_name: table_name.unwrap_or_default().to_string(),
        index_name: index_name.unwrap_or("NULL").to_string(),
        index_type: index_type.unwrap_or_default().to_string(),
        fragmentation_percent: fragmentation_percent.unwrap_or(0.0),
        page_count: page_count.unwrap_or(0),
    }
}
