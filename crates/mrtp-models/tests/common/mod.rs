//! Common test utilities: in-memory layouts, event recorders and a failing connection

#![allow(dead_code)]

use mrtp_core::{Connection, MrtpError, QueryResult, Result, StatementResult, TableKind, Value};
use mrtp_driver_sqlite::{SqliteConnection, create_layout_schema};
use mrtp_models::{ModelEvent, PagedModel, SessionContext, SessionEvent, TableQuery};
use mrtp_settings::PagingSettings;
use parking_lot::Mutex;
use std::sync::Arc;

/// Fresh in-memory database with the layout schema
pub fn layout_connection() -> Arc<dyn Connection> {
    let conn = SqliteConnection::open_in_memory().expect("in-memory database");
    create_layout_schema(&conn).expect("layout schema");
    conn.into_shared()
}

/// Session over a fresh layout with `items_per_page` rows per page for `kind`
pub fn session(kind: TableKind, items_per_page: usize, batch_size: usize) -> SessionContext {
    let mut settings = PagingSettings::default();
    settings.items_per_page.set(kind, items_per_page);
    settings.batch_size = batch_size;
    SessionContext::new(layout_connection(), settings)
}

pub fn exec(ctx: &SessionContext, sql: &str, params: &[Value]) {
    ctx.connection()
        .execute(sql, params)
        .unwrap_or_else(|e| panic!("{sql}: {e}"));
}

/// Insert `count` stations named `S000`, `S001`, ... with phone numbers on even rows
pub fn seed_stations(ctx: &SessionContext, count: usize) {
    for i in 0..count {
        let phone = (i % 2 == 0).then_some(1000 + i as i64);
        exec(
            ctx,
            "INSERT INTO stations (name, type, phone_number) VALUES (?, ?, ?)",
            &[
                Value::String(format!("S{:03}", i)),
                Value::Int64((i % 3) as i64),
                Value::from(phone),
            ],
        );
    }
}

pub fn seed_owners(ctx: &SessionContext, names: &[&str]) {
    for name in names {
        exec(ctx, "INSERT INTO rs_owners (name) VALUES (?)", &[Value::from(*name)]);
    }
}

/// Records every event of a model bus
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<ModelEvent>>>,
}

impl EventRecorder {
    pub fn attach<Q: TableQuery>(model: &PagedModel<Q>) -> Self {
        let recorder = Self::default();
        let sink = recorder.events.clone();
        model
            .events()
            .subscribe(move |event: &ModelEvent| sink.lock().push(event.clone()));
        recorder
    }

    pub fn take(&self) -> Vec<ModelEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ModelEvent::ModelError(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Records session-wide notifications
pub fn record_session(ctx: &SessionContext) -> Arc<Mutex<Vec<SessionEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    ctx.events()
        .subscribe(move |event: &SessionEvent| sink.lock().push(*event));
    events
}

/// Read every row of the current page through the model, loading as needed
pub fn page_values<Q: TableQuery>(model: &mut PagedModel<Q>, column: usize) -> Vec<Value> {
    let count = model.current_item_count();
    (0..count)
        .map(|row| {
            if !model.ensure_loaded(row..row + 1) {
                panic!("row {row} not loaded");
            }
            model.cached_data(row, column).expect("cached value")
        })
        .collect()
}

/// Connection whose every statement fails, logging the SQL it received
pub struct FailingConnection {
    pub query_log: Arc<Mutex<Vec<String>>>,
}

impl FailingConnection {
    pub fn new() -> Self {
        Self {
            query_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Connection for FailingConnection {
    fn driver_name(&self) -> &str {
        "failing"
    }

    fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.query_log.lock().push(sql.to_string());
        Err(MrtpError::Query("disk I/O error".into()))
    }

    fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        self.query_log.lock().push(sql.to_string());
        Err(MrtpError::Query("disk I/O error".into()))
    }
}
