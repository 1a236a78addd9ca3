use async_trait::async_trait;
use bigdecimal::BigDecimal;
use connectors::{
    document::{
        base::{
            error::StoreError,
            store::{DocumentStore, StoreStats},
        },
        bson::{Bson, Document},
    },
    sql::base::{
        adapter::{DatabaseKind, SqlAdapter},
        error::{ConnectorError, DbError},
        metadata::table::KeyedTable,
    },
};
use engine_core::{
    listener::{PageEvent, SyncListener},
    report::MappingReport,
    retry::RetryPolicy,
};
use engine_runtime::execution::options::RunOptions;
use model::{
    core::{
        schema::ColumnSchema,
        value::{FieldValue, Value},
    },
    mapping::{SyncSettings, TableMapping, TableName},
    records::row::{ROW_ID, RowData},
    pagination::cursor::Cursor,
};
use planner::query::page::PageQuery;
use std::{
    cmp,
    collections::{HashMap, HashSet},
    io,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

pub const SQL_SERVER_2019: &str =
    "Microsoft SQL Server 2019 (RTM-CU18) (KB5017593) - 15.0.4261.1 (X64) \n\tDeveloper Edition";
pub const SQL_SERVER_2000: &str =
    "Microsoft SQL Server  2000 - 8.00.2039 (Intel X86) \n\tStandard Edition";

pub const SOURCE_CONN: &str = "server=tcp:localhost,1433;database=shop;user=sa;password=Secret!1";
pub const TARGET_CONN: &str = "mongodb://localhost:27017/shop";

pub const ORDER_COLUMNS: &[(&str, &str)] = &[
    ("OrderID", "int"),
    ("Customer", "nvarchar"),
    ("Total", "decimal"),
];

struct FakeTable {
    schema: ColumnSchema,
    rows: Vec<Vec<Value>>,
}

/// In-memory source. Rows are kept in insertion order; every page query
/// ranks them by its ordering columns first, so the ordinal of a row is its
/// rank, as `ROW_NUMBER()` would assign it.
pub struct FakeSource {
    version: String,
    tables: Mutex<HashMap<String, FakeTable>>,
    transient_fetch_failures: AtomicUsize,
    version_checks: AtomicUsize,
    fetches: Mutex<Vec<(String, Cursor)>>,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            version: SQL_SERVER_2019.to_string(),
            tables: Mutex::new(HashMap::new()),
            transient_fetch_failures: AtomicUsize::new(0),
            version_checks: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_version(mut self, banner: &str) -> Self {
        self.version = banner.to_string();
        self
    }

    pub fn with_table(self, name: &str, columns: &[(&str, &str)], rows: Vec<Vec<Value>>) -> Self {
        self.tables.lock().unwrap().insert(
            key(name),
            FakeTable {
                schema: ColumnSchema::from_pairs(&format!("dbo.{name}"), columns),
                rows,
            },
        );
        self
    }

    /// Orders stored newest first, so only the ranking puts them in key order.
    pub fn with_orders(self, name: &str, count: usize) -> Self {
        let mut rows = order_rows(1, count);
        rows.reverse();
        self.with_table(name, ORDER_COLUMNS, rows)
    }

    pub fn append_rows(&self, name: &str, rows: Vec<Vec<Value>>) {
        if let Some(table) = self.tables.lock().unwrap().get_mut(&key(name)) {
            table.rows.extend(rows);
        }
    }

    pub fn fail_next_fetches(&self, count: usize) {
        self.transient_fetch_failures.store(count, Ordering::SeqCst);
    }

    pub fn version_checks(&self) -> usize {
        self.version_checks.load(Ordering::SeqCst)
    }

    /// Cursors of every successful page query against `table`, in order.
    pub fn fetched_cursors(&self, table: &str) -> Vec<Cursor> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == &key(table))
            .map(|(_, c)| *c)
            .collect()
    }
}

fn key(table: &str) -> String {
    table.to_ascii_lowercase()
}

/// Orders numbered from `first`; keys step by ten so they are never equal
/// to the ordinals.
pub fn order_rows(first: usize, count: usize) -> Vec<Vec<Value>> {
    (first..first + count)
        .map(|n| {
            vec![
                Value::Int(n as i64 * 10),
                Value::String(format!("customer-{}", n % 7)),
                Value::Decimal(BigDecimal::from(n as i64) / BigDecimal::from(4)),
            ]
        })
        .collect()
}

#[async_trait]
impl SqlAdapter for FakeSource {
    async fn connect(_conn_str: &str) -> Result<Self, ConnectorError> {
        Ok(Self::new())
    }

    async fn server_version(&self) -> Result<String, DbError> {
        self.version_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.version.clone())
    }

    async fn table_exists(&self, table: &TableName) -> Result<bool, DbError> {
        Ok(self.tables.lock().unwrap().contains_key(&key(&table.name)))
    }

    async fn table_schema(&self, table: &TableName) -> Result<ColumnSchema, DbError> {
        self.tables
            .lock()
            .unwrap()
            .get(&key(&table.name))
            .map(|t| t.schema.clone())
            .ok_or_else(|| DbError::Metadata(format!("no such table {table}")))
    }

    async fn keyed_tables(&self) -> Result<Vec<KeyedTable>, DbError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .values()
            .filter_map(|t| {
                t.schema.first().map(|pk| KeyedTable {
                    table: t.schema.table.parse().unwrap(),
                    key_column: pk.name.clone(),
                    row_count: t.rows.len() as u64,
                })
            })
            .collect())
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<RowData>, DbError> {
        if self.transient_fetch_failures.load(Ordering::SeqCst) > 0 {
            self.transient_fetch_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(DbError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        let table_key = key(&query.table.name);
        self.fetches
            .lock()
            .unwrap()
            .push((table_key.clone(), query.cursor));

        let tables = self.tables.lock().unwrap();
        let table = tables
            .get(&table_key)
            .ok_or_else(|| DbError::Metadata(format!("no such table {}", query.table)))?;

        let names: Vec<String> = table.schema.names().map(str::to_string).collect();
        let keys: Vec<usize> = query
            .order_by
            .iter()
            .filter_map(|column| names.iter().position(|n| n.eq_ignore_ascii_case(column)))
            .collect();

        let mut ranked: Vec<&Vec<Value>> = table.rows.iter().collect();
        ranked.sort_by(|a, b| {
            keys.iter()
                .map(|&i| a[i].compare(&b[i]).unwrap_or(cmp::Ordering::Equal))
                .find(|order| order.is_ne())
                .unwrap_or(cmp::Ordering::Equal)
        });

        let after = query.cursor.ordinal().unwrap_or(0) as usize;
        Ok(ranked
            .into_iter()
            .enumerate()
            .skip(after)
            .take(query.page_size.get())
            .map(|(idx, values)| {
                let mut fields: Vec<FieldValue> = names
                    .iter()
                    .zip(values)
                    .map(|(name, value)| FieldValue::new(name, Some(value.clone()), value.data_type()))
                    .collect();
                let ordinal = Value::Int(idx as i64 + 1);
                fields.push(FieldValue::new(ROW_ID, Some(ordinal.clone()), ordinal.data_type()));
                RowData::new(&table.schema.table, fields)
            })
            .collect())
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Other("fake".into())
    }
}

/// In-memory target that records every clear and insert. Like a MongoDB
/// collection it rejects a second document with the same `_id`.
#[derive(Default)]
pub struct FakeStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    clears: Mutex<Vec<String>>,
    inserts: Mutex<HashMap<String, usize>>,
    short_inserts: Mutex<HashMap<String, usize>>,
    lost_replies: Mutex<HashMap<String, usize>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `call`-th insert (1-based) into `collection` silently drops two
    /// documents.
    pub fn short_insert_on(self, collection: &str, call: usize) -> Self {
        self.short_inserts
            .lock()
            .unwrap()
            .insert(collection.to_string(), call);
        self
    }

    /// The `call`-th insert (1-based) into `collection` is applied, but the
    /// caller sees a dropped connection instead of the reply.
    pub fn lose_reply_on(self, collection: &str, call: usize) -> Self {
        self.lost_replies
            .lock()
            .unwrap()
            .insert(collection.to_string(), call);
        self
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clears(&self) -> Vec<String> {
        self.clears.lock().unwrap().clone()
    }

    pub fn seed(&self, collection: &str, documents: Vec<Document>) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn clear(&self, collection: &str) -> Result<u64, StoreError> {
        self.clears.lock().unwrap().push(collection.to_string());
        let removed = self
            .collections
            .lock()
            .unwrap()
            .remove(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0);
        Ok(removed)
    }

    async fn insert_batch(
        &self,
        collection: &str,
        mut documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        let call = {
            let mut inserts = self.inserts.lock().unwrap();
            let count = inserts.entry(collection.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if self.short_inserts.lock().unwrap().get(collection) == Some(&call) {
            documents.truncate(documents.len().saturating_sub(2));
        }

        let inserted = documents.len();
        {
            let mut collections = self.collections.lock().unwrap();
            let stored = collections.entry(collection.to_string()).or_default();
            let mut ids: HashSet<String> = stored
                .iter()
                .filter_map(|d| d.get("_id").map(Bson::to_string))
                .collect();
            // Ordered insert: documents before the duplicate stay written.
            for document in documents {
                if let Some(id) = document.get("_id") {
                    if !ids.insert(id.to_string()) {
                        return Err(StoreError::DuplicateKey {
                            collection: collection.to_string(),
                            message: format!("E11000 duplicate key error dup key: {{ _id: {id} }}"),
                        });
                    }
                }
                stored.push(document);
            }
        }

        if self.lost_replies.lock().unwrap().get(collection) == Some(&call) {
            return Err(StoreError::Mongo(
                io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer").into(),
            ));
        }
        Ok(inserted)
    }

    async fn remove_after(&self, collection: &str, ordinal: u64) -> Result<u64, StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = stored.len();
        stored.retain(|d| match d.get_i64(ROW_ID) {
            Ok(row_id) => row_id <= ordinal as i64,
            Err(_) => true,
        });
        Ok((before - stored.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(StoreStats {
            database: "shop".into(),
            collections: collections.len() as u64,
            documents: collections.values().map(|d| d.len() as u64).sum(),
            data_size: 0,
        })
    }
}

/// Records page events and optionally cancels the run after some pages.
#[derive(Default)]
pub struct RecordingListener {
    pub pages: Mutex<Vec<PageEvent>>,
    pub finished: Mutex<Vec<MappingReport>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingListener {
    pub fn cancelling_after(pages: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after: Some((pages, token)),
            ..Default::default()
        }
    }

    pub fn page_cursors(&self, collection: &str) -> Vec<Cursor> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.collection == collection)
            .map(|p| p.cursor)
            .collect()
    }
}

impl SyncListener for RecordingListener {
    fn page_loaded(&self, event: &PageEvent) {
        let mut pages = self.pages.lock().unwrap();
        pages.push(event.clone());
        if let Some((limit, token)) = &self.cancel_after {
            if pages.len() >= *limit {
                token.cancel();
            }
        }
    }

    fn mapping_finished(&self, report: &MappingReport) {
        self.finished.lock().unwrap().push(report.clone());
    }
}

pub fn mapping(table: &str, collection: &str, page_size: i64) -> TableMapping {
    TableMapping::new(table.parse().unwrap(), collection)
        .with_primary_key("OrderID")
        .with_page_size(page_size.into())
}

pub fn settings(mappings: Vec<TableMapping>) -> SyncSettings {
    mappings
        .into_iter()
        .fold(SyncSettings::new(SOURCE_CONN, TARGET_CONN), SyncSettings::with_mapping)
}

pub fn fast_options() -> RunOptions {
    RunOptions::default().with_retry(RetryPolicy::new(
        3,
        Duration::from_millis(1),
        Duration::from_millis(2),
    ))
}
