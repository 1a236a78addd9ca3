use crate::sql::{
    base::{
        adapter::{DatabaseKind, SqlAdapter},
        error::{ConnectorError, DbError},
        metadata::table::KeyedTable,
    },
    mssql::{params::bind_values, row::DbRow},
};
use async_trait::async_trait;
use deadpool::managed::{self, Metrics, Object, Pool, PoolError, RecycleResult};
use model::{
    core::{
        schema::{ColumnDef, ColumnSchema},
        value::Value,
    },
    mapping::TableName,
    records::row::RowData,
};
use planner::query::page::PageQuery;
use tiberius::{Client, Config, Query, error::Error as TdsError};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, warn};

type TdsClient = Client<Compat<TcpStream>>;

/// Opens TDS connections on demand for the pool.
pub struct TdsManager {
    config: Config,
}

impl managed::Manager for TdsManager {
    type Type = TdsClient;
    type Error = ConnectorError;

    async fn create(&self) -> Result<TdsClient, ConnectorError> {
        connect_client(self.config.clone()).await
    }

    async fn recycle(
        &self,
        _client: &mut TdsClient,
        _metrics: &Metrics,
    ) -> RecycleResult<ConnectorError> {
        // Connections that failed mid-statement never come back; see `release`.
        Ok(())
    }
}

/// SQL Server source over a pool of TDS connections.
///
/// Each statement checks out its own connection, so mappings running in
/// parallel do not wait on each other. A connection that fails with a
/// transient error is dropped and the retry dials a fresh one.
#[derive(Clone)]
pub struct MsSqlAdapter {
    pool: Pool<TdsManager>,
}

const QUERY_SERVER_VERSION_SQL: &str = include_str!("sql/server_version.sql");
const QUERY_TABLE_EXISTS_SQL: &str = include_str!("sql/table_exists.sql");
const QUERY_TABLE_COLUMNS_SQL: &str = include_str!("sql/table_columns.sql");
const QUERY_KEYED_TABLES_SQL: &str = include_str!("sql/keyed_tables.sql");

impl MsSqlAdapter {
    /// Connects with room for `max_connections` concurrent statements.
    /// One connection is opened up front so bad credentials fail here.
    pub async fn connect_pooled(
        conn_str: &str,
        max_connections: usize,
    ) -> Result<Self, ConnectorError> {
        let config = Config::from_ado_string(conn_str)?;
        debug!(addr = %config.get_addr(), max_connections, "Connecting to SQL Server");

        let pool = Pool::builder(TdsManager { config })
            .max_size(max_connections.max(1))
            .build()
            .map_err(|e| ConnectorError::Pool(e.to_string()))?;

        match pool.get().await {
            Ok(_) => Ok(MsSqlAdapter { pool }),
            Err(PoolError::Backend(e)) => Err(e),
            Err(e) => Err(ConnectorError::Pool(e.to_string())),
        }
    }

    async fn query_rows(
        &self,
        sql: &str,
        params: &[Value],
        entity: &str,
    ) -> Result<Vec<RowData>, DbError> {
        let mut client = self.pool.get().await.map_err(checkout_error)?;

        let mut query = Query::new(sql);
        bind_values(&mut query, params);
        let result = match query.query(&mut *client).await {
            Ok(stream) => stream.into_first_result().await,
            Err(e) => Err(e),
        };

        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                let err = DbError::from(e);
                release(client, &err);
                return Err(err);
            }
        };

        rows.into_iter()
            .map(|row| DbRow::new(row).into_row_data(entity))
            .collect()
    }

    fn table_params(table: &TableName) -> Vec<Value> {
        vec![
            Value::String(table.schema_or_default().to_string()),
            Value::String(table.name.clone()),
        ]
    }
}

fn checkout_error(err: PoolError<ConnectorError>) -> DbError {
    match err {
        PoolError::Backend(e) => DbError::Connect(e),
        other => DbError::Unknown(other.to_string()),
    }
}

/// Keeps a connection that failed with a transient error out of the pool.
fn release<M: managed::Manager>(conn: Object<M>, err: &DbError) {
    if err.is_transient() {
        warn!(error = %err, "Discarding SQL Server connection");
        drop(Object::take(conn));
    }
}

async fn connect_client(config: Config) -> Result<TdsClient, ConnectorError> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure SQL gateways may redirect the login to another node.
        Err(TdsError::Routing { host, port }) => {
            info!(%host, port, "SQL Server redirected connection");
            let mut config = config;
            config.host(&host);
            config.port(port);
            let tcp = TcpStream::connect(config.get_addr()).await?;
            tcp.set_nodelay(true)?;
            Ok(Client::connect(config, tcp.compat_write()).await?)
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl SqlAdapter for MsSqlAdapter {
    async fn connect(conn_str: &str) -> Result<Self, ConnectorError> {
        Self::connect_pooled(conn_str, 1).await
    }

    async fn server_version(&self) -> Result<String, DbError> {
        let rows = self.query_rows(QUERY_SERVER_VERSION_SQL, &[], "").await?;
        rows.first()
            .and_then(|row| row.get_value("version").as_string())
            .ok_or_else(|| DbError::Metadata("@@VERSION returned no rows".to_string()))
    }

    async fn table_exists(&self, table: &TableName) -> Result<bool, DbError> {
        let rows = self
            .query_rows(QUERY_TABLE_EXISTS_SQL, &Self::table_params(table), "")
            .await?;
        let count = rows
            .first()
            .and_then(|row| row.get_value("table_count").as_i64())
            .unwrap_or(0);
        Ok(count > 0)
    }

    async fn table_schema(&self, table: &TableName) -> Result<ColumnSchema, DbError> {
        let rows = self
            .query_rows(QUERY_TABLE_COLUMNS_SQL, &Self::table_params(table), "")
            .await?;

        let columns = rows
            .iter()
            .map(|row| {
                let name = row.get_value("column_name").as_string();
                let data_type = row.get_value("data_type").as_string();
                let ordinal = row.get_value("ordinal_position").as_i64();
                match (name, data_type, ordinal) {
                    (Some(name), Some(data_type), Some(ordinal)) => Ok(ColumnDef::new(
                        &name,
                        &data_type,
                        usize::try_from(ordinal).unwrap_or_default(),
                    )),
                    _ => Err(DbError::Metadata(format!(
                        "incomplete column metadata for table {table}"
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ColumnSchema::new(&table.to_string(), columns))
    }

    async fn keyed_tables(&self) -> Result<Vec<KeyedTable>, DbError> {
        let rows = self.query_rows(QUERY_KEYED_TABLES_SQL, &[], "").await?;
        rows.iter()
            .map(|row| {
                let schema = row.get_value("schema_name").as_string();
                let name = row.get_value("table_name").as_string();
                let key = row.get_value("key_column").as_string();
                match (schema, name, key) {
                    (Some(schema), Some(name), Some(key_column)) => Ok(KeyedTable {
                        table: TableName::new(Some(&schema), &name),
                        key_column,
                        row_count: row
                            .get_value("row_count")
                            .as_i64()
                            .and_then(|c| u64::try_from(c).ok())
                            .unwrap_or(0),
                    }),
                    _ => Err(DbError::Metadata(
                        "incomplete primary key metadata".to_string(),
                    )),
                }
            })
            .collect()
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<RowData>, DbError> {
        debug!(table = %query.table, cursor = %query.cursor, sql = %query.sql, "Fetching page");
        self.query_rows(&query.sql, &query.params, &query.table.to_string())
            .await
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MsSql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        sync::atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct CountingManager {
        created: AtomicUsize,
    }

    impl managed::Manager for CountingManager {
        type Type = usize;
        type Error = io::Error;

        async fn create(&self) -> Result<usize, io::Error> {
            Ok(self.created.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn recycle(
            &self,
            _conn: &mut usize,
            _metrics: &Metrics,
        ) -> RecycleResult<io::Error> {
            Ok(())
        }
    }

    fn pool() -> Pool<CountingManager> {
        Pool::builder(CountingManager::default())
            .max_size(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_transient_failure_discards_connection() {
        let pool = pool();
        let conn = pool.get().await.unwrap();
        assert_eq!(*conn, 1);

        let err = DbError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        release(conn, &err);

        assert_eq!(*pool.get().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_keeps_connection() {
        let pool = pool();
        let conn = pool.get().await.unwrap();

        release(conn, &DbError::Metadata("no rows".into()));

        assert_eq!(*pool.get().await.unwrap(), 1);
    }

    #[test]
    fn test_checkout_failure_keeps_backend_error() {
        let err = checkout_error(PoolError::Backend(ConnectorError::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        ))));
        assert!(matches!(err, DbError::Connect(_)));
        assert!(err.is_transient());
    }
}
