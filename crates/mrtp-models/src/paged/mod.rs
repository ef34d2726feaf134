//! Generic paged, filterable, sorted table model

mod cache;
mod paging;

use mrtp_core::{Connection, EventBus, MrtpError, StatementResult, Value};
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::event::ModelEvent;
use crate::filter::{FilterFlags, filter_predicate, is_null_filter};
use crate::session::{SessionContext, SessionEvent};
use crate::table::{ColumnDef, TableQuery};
use cache::RowCache;
use paging::PagingState;

/// Result of reading a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    Loaded(Value),
    /// The row was not cached; a fetch ran and `DataChanged` announced it
    Loading,
    /// Row or column outside the current page
    Invalid,
}

impl CellData {
    pub const PLACEHOLDER: &'static str = "...";

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl std::fmt::Display for CellData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded(v) => write!(f, "{}", v),
            Self::Loading => f.write_str(Self::PLACEHOLDER),
            Self::Invalid => Ok(()),
        }
    }
}

/// A window onto a filtered, sorted relational result set.
///
/// Only up to `batch_size` rows of the current page are held in memory. Reads
/// outside that window trigger one bounded fetch and return
/// [`CellData::Loading`]; the fetched range is announced with
/// [`ModelEvent::DataChanged`]. Failures never escape: they are published as
/// [`ModelEvent::ModelError`] and the operation returns `false`/`None`.
pub struct PagedModel<Q: TableQuery> {
    pub(crate) query: Q,
    pub(crate) connection: Arc<dyn Connection>,
    pub(crate) session_events: Arc<EventBus<SessionEvent>>,
    events: EventBus<ModelEvent>,
    paging: PagingState,
    cache: RowCache<Q::Item>,
    batch_size: usize,
    filters: Vec<String>,
    null_filter: String,
    sort_column: usize,
    last_access: Instant,
}

impl<Q: TableQuery> PagedModel<Q> {
    /// Model over `query` with paging parameters taken from the session settings
    pub fn with_query(ctx: &SessionContext, query: Q) -> Self {
        let settings = ctx.settings();
        let items_per_page = settings.items_per_page(query.kind());
        let batch_size = settings.batch_size;
        Self::with_paging(ctx, query, items_per_page, batch_size)
    }

    pub fn with_paging(
        ctx: &SessionContext,
        query: Q,
        items_per_page: usize,
        batch_size: usize,
    ) -> Self {
        let column_count = query.columns().len();
        let sort_column = query.default_sort_column();
        Self {
            connection: ctx.connection().clone(),
            session_events: ctx.events().clone(),
            events: EventBus::new(),
            paging: PagingState::new(items_per_page),
            cache: RowCache::new(),
            batch_size: batch_size.max(1),
            filters: vec![String::new(); column_count],
            null_filter: ctx.settings().null_filter.clone(),
            sort_column,
            last_access: Instant::now(),
            query,
        }
    }

    pub fn events(&self) -> &EventBus<ModelEvent> {
        &self.events
    }

    pub fn table(&self) -> &Q {
        &self.query
    }

    pub fn columns(&self) -> &'static [ColumnDef] {
        self.query.columns()
    }

    pub fn column_count(&self) -> usize {
        self.query.columns().len()
    }

    pub fn header(&self, column: usize) -> Option<&'static str> {
        self.query.columns().get(column).map(|c| c.header)
    }

    /// 1-based absolute row number shown in the vertical header
    pub fn row_header(&self, row: usize) -> u64 {
        self.paging.page_offset() + row as u64 + 1
    }

    pub fn total_items_count(&self) -> u64 {
        self.paging.total()
    }

    pub fn page_count(&self) -> usize {
        self.paging.page_count()
    }

    pub fn current_page(&self) -> usize {
        self.paging.cur_page()
    }

    /// Rows on the current page
    pub fn current_item_count(&self) -> usize {
        self.paging.cur_item_count()
    }

    pub fn items_per_page(&self) -> usize {
        self.paging.items_per_page()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn sorting_column(&self) -> usize {
        self.sort_column
    }

    /// Rows currently materialized
    pub fn cached_range(&self) -> Range<usize> {
        self.cache.range()
    }

    // ---- paging ----

    /// Recount rows under the current filters.
    ///
    /// When the count differs from the known one, or `force_update` is set,
    /// the cache is dropped and paging recomputed. Otherwise nothing happens
    /// and no event is published.
    #[tracing::instrument(skip(self), fields(table = ?self.query.kind()))]
    pub fn refresh_data(&mut self, force_update: bool) -> bool {
        let count = match self.recalc_total_item_count() {
            Ok(count) => count,
            Err(err) => {
                self.report_error(&err);
                return false;
            }
        };

        if count == self.paging.total() && !force_update {
            return true;
        }

        self.events.emit(&ModelEvent::ItemsAboutToChange);

        let prev_page = self.paging.cur_page();
        self.cache.clear();
        self.paging.set_total(count);
        tracing::debug!(
            total = count,
            pages = self.paging.page_count(),
            page = self.paging.cur_page(),
            "paging recomputed"
        );

        self.events.emit(&ModelEvent::TotalCountChanged(count));
        self.events
            .emit(&ModelEvent::PageCountChanged(self.paging.page_count()));
        if self.paging.cur_page() != prev_page {
            self.events
                .emit(&ModelEvent::CurrentPageChanged(self.paging.cur_page()));
        }
        self.events.emit(&ModelEvent::ModelReset);
        true
    }

    /// Show `page`. Rejected if already current or out of range.
    pub fn switch_to_page(&mut self, page: usize) -> bool {
        let prev_items = self.paging.cur_item_count();
        if !self.paging.set_page(page) {
            return false;
        }
        self.cache.clear();

        if self.paging.cur_item_count() != prev_items {
            self.events.emit(&ModelEvent::ModelReset);
        }
        self.events.emit(&ModelEvent::CurrentPageChanged(page));
        self.emit_all_rows_changed();
        true
    }

    // ---- reading ----

    /// Cell at `row`, `column` of the current page.
    ///
    /// An uncached row is fetched before returning and reported as
    /// [`CellData::Loading`] for this call only.
    pub fn data(&mut self, row: usize, column: usize) -> CellData {
        if row >= self.paging.cur_item_count() || column >= self.column_count() {
            return CellData::Invalid;
        }
        self.last_access = Instant::now();

        if let Some(item) = self.cache.get(row) {
            return CellData::Loaded(self.query.cell(item, column));
        }
        self.fetch_row(row);
        CellData::Loading
    }

    /// Record at `row`, fetching its window first when needed.
    ///
    /// Returns `None` for this call when a fetch was necessary.
    pub fn get_row(&mut self, row: usize) -> Option<&Q::Item> {
        if row >= self.paging.cur_item_count() {
            return None;
        }
        self.last_access = Instant::now();

        if self.cache.contains(row) {
            return self.cache.get(row);
        }
        self.fetch_row(row);
        None
    }

    /// Cached record, never fetches
    pub fn cached_row(&self, row: usize) -> Option<&Q::Item> {
        if row >= self.paging.cur_item_count() {
            return None;
        }
        self.cache.get(row)
    }

    /// Cached cell, never fetches
    pub fn cached_data(&self, row: usize, column: usize) -> Option<Value> {
        if column >= self.column_count() {
            return None;
        }
        self.cached_row(row).map(|item| self.query.cell(item, column))
    }

    /// Make sure `rows` (clamped to the current page) are cached.
    ///
    /// Returns whether every requested row is available afterwards. A range
    /// wider than the batch size can never be fully cached.
    pub fn ensure_loaded(&mut self, rows: Range<usize>) -> bool {
        let end = rows.end.min(self.paging.cur_item_count());
        if rows.start >= end {
            return true;
        }
        self.last_access = Instant::now();

        let cached = self.cache.range();
        if cached.start <= rows.start && end <= cached.end {
            return true;
        }
        self.internal_fetch(rows.start);

        let cached = self.cache.range();
        cached.start <= rows.start && end <= cached.end
    }

    // ---- filtering and sorting ----

    /// Current filter text and accepted filter kinds of `column`
    pub fn filter_at_col(&self, column: usize) -> (&str, FilterFlags) {
        match self.query.columns().get(column) {
            Some(def) => (self.filters[column].as_str(), def.filter),
            None => ("", FilterFlags::empty()),
        }
    }

    /// Store a filter for `column`; follow with `refresh_data(true)`.
    ///
    /// Rejected without any event when the column cannot be filtered or the
    /// text is the null sentinel and the column does not accept it.
    pub fn set_filter_at_col(&mut self, column: usize, text: &str) -> bool {
        let Some(def) = self.query.columns().get(column) else {
            return false;
        };
        if def.filter.is_empty() {
            return false;
        }
        let accepts_null = def.filter.contains(FilterFlags::EXPLICIT_NULL);
        if is_null_filter(text, &self.null_filter) && !accepts_null {
            return false;
        }

        self.filters[column] = text.to_string();
        self.events.emit(&ModelEvent::FilterChanged);
        true
    }

    pub fn clear_filters(&mut self) {
        if self.filters.iter().all(String::is_empty) {
            return;
        }
        for filter in &mut self.filters {
            filter.clear();
        }
        self.events.emit(&ModelEvent::FilterChanged);
    }

    /// Sort by `column`. Rejected for the current or a non-sortable column.
    pub fn set_sorting_column(&mut self, column: usize) -> bool {
        if column == self.sort_column
            || !self
                .query
                .columns()
                .get(column)
                .is_some_and(ColumnDef::is_sortable)
        {
            return false;
        }

        self.cache.clear();
        self.sort_column = column;
        self.emit_all_rows_changed();
        true
    }

    // ---- cache management ----

    /// Drop every cached row at index `row` or later.
    ///
    /// Any operation that may move rows must call this; readers then fetch
    /// again instead of trusting positions.
    pub fn invalidate_from(&mut self, row: usize) {
        self.cache.truncate_from(row);
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop the cache when no row was read for `timeout`.
    pub fn evict_if_idle(&mut self, timeout: Duration, now: Instant) -> bool {
        if self.cache.is_empty() || now.saturating_duration_since(self.last_access) < timeout {
            return false;
        }
        tracing::debug!(table = ?self.query.kind(), "evicting idle cache");
        self.cache.clear();
        true
    }

    // ---- internals ----

    fn recalc_total_item_count(&self) -> mrtp_core::Result<u64> {
        let mut params = Vec::new();
        let where_clause = self.where_clause(&mut params);
        let sql = format!(
            "SELECT COUNT(1) FROM {}{}",
            self.query.from_clause(),
            where_clause
        );
        let count = self
            .connection
            .query_scalar(&sql, &params)?
            .as_i64()
            .ok_or_else(|| MrtpError::Query("Row count is not an integer".into()))?;
        Ok(count.max(0) as u64)
    }

    fn where_clause(&self, params: &mut Vec<Value>) -> String {
        let predicates: Vec<String> = self
            .query
            .columns()
            .iter()
            .zip(&self.filters)
            .filter(|(def, text)| !text.is_empty() && !def.filter.is_empty())
            .map(|(def, text)| {
                let match_null = def.filter.contains(FilterFlags::EXPLICIT_NULL)
                    && is_null_filter(text, &self.null_filter);
                filter_predicate(def.filter_exprs, text, match_null, params)
            })
            .collect();

        if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        }
    }

    fn order_by_clause(&self) -> String {
        let id = self.query.id_expr();
        match self
            .query
            .columns()
            .get(self.sort_column)
            .and_then(|def| def.sort_expr)
        {
            Some(expr) => format!(" ORDER BY {}, {}", expr, id),
            None => format!(" ORDER BY {}", id),
        }
    }

    /// Position a fetch window on `row`: ending at it when scrolling up,
    /// starting at it when scrolling down, centred when nothing is cached.
    fn fetch_row(&mut self, row: usize) {
        let first = if self.cache.is_empty() {
            row.saturating_sub(self.batch_size / 2)
        } else if row < self.cache.first_row() {
            (row + 1).saturating_sub(self.batch_size)
        } else {
            row
        };
        self.internal_fetch(first);
    }

    /// Replace the cache with up to `batch_size` rows starting at `first`.
    ///
    /// `DataChanged` is emitted only after the cache holds the new window.
    /// Subscribers get `&ModelEvent` and cannot reach the model, so a fetch
    /// never starts from inside another one.
    fn internal_fetch(&mut self, first: usize) -> bool {
        let available = self.paging.cur_item_count().saturating_sub(first);
        if available == 0 {
            return false;
        }
        let limit = available.min(self.batch_size);
        let offset = self.paging.page_offset() + first as u64;

        let mut params = Vec::new();
        let where_clause = self.where_clause(&mut params);
        let sql = format!(
            "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
            self.query.select_list(),
            self.query.from_clause(),
            where_clause,
            self.order_by_clause()
        );
        params.push(Value::Int64(limit as i64));
        params.push(Value::Int64(offset as i64));

        tracing::debug!(first, offset, limit, "fetching rows");

        let result = self.connection.query(&sql, &params).and_then(|res| {
            let mut items = Vec::with_capacity(limit);
            for row in &res.rows {
                items.push(self.query.decode_row(row)?);
            }
            Ok(items)
        });

        match result {
            Ok(mut items) => {
                items.shrink_to_fit();
                let fetched = items.len();
                self.cache.replace(first, items);
                if fetched > 0 {
                    self.events.emit(&ModelEvent::DataChanged {
                        first,
                        last: first + fetched - 1,
                    });
                }
                true
            }
            Err(err) => {
                self.report_error(&err);
                false
            }
        }
    }

    fn emit_all_rows_changed(&self) {
        let count = self.paging.cur_item_count();
        if count > 0 {
            self.events.emit(&ModelEvent::DataChanged {
                first: 0,
                last: count - 1,
            });
        }
    }

    // ---- helpers for table-specific mutators ----

    pub(crate) fn execute(&self, sql: &str, params: &[Value]) -> mrtp_core::Result<StatementResult> {
        self.connection.execute(sql, params)
    }

    /// Publish a failure as `ModelError`
    pub(crate) fn report_error(&self, err: &MrtpError) {
        tracing::warn!(table = ?self.query.kind(), error = %err, "model error");
        self.emit_error(crate::messages::generic_error(err));
    }

    pub(crate) fn emit_error(&self, message: String) {
        self.events.emit(&ModelEvent::ModelError(message));
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        self.session_events.emit(&event);
    }

    /// Record a successful in-place edit of `column` at `row`.
    ///
    /// The cached record is patched unless the edit may move the row under
    /// the active sort, in which case the cache is invalidated and every
    /// row of the page reported as changed.
    pub(crate) fn commit_edit(&mut self, row: usize, column: usize, apply: impl FnOnce(&mut Q::Item)) {
        if self.query.sort_depends_on(self.sort_column, column) {
            self.invalidate_from(0);
            self.emit_all_rows_changed();
            return;
        }
        if let Some(item) = self.cache.get_mut(row) {
            apply(item);
        }
        self.events.emit(&ModelEvent::DataChanged {
            first: row,
            last: row,
        });
    }

    /// Cached row holding the record matching `pred`
    pub(crate) fn find_cached(&self, pred: impl Fn(&Q::Item) -> bool) -> Option<usize> {
        self.cache.position(pred)
    }

    pub(crate) fn cached_row_mut(&mut self, row: usize) -> Option<&mut Q::Item> {
        self.cache.get_mut(row)
    }

    /// Delete by primary key, then refresh.
    ///
    /// Reference failures are turned into `in_use(name)`, with `name` read
    /// through `name_sql` (one `?` for the id).
    pub(crate) fn delete_record(
        &mut self,
        table: &str,
        id: i64,
        name_sql: &str,
        in_use: impl FnOnce(&str) -> String,
    ) -> bool {
        let sql = format!("DELETE FROM {} WHERE id = ?", table);
        match self.execute(&sql, &[Value::Int64(id)]) {
            Ok(res) if res.affected_rows == 0 => {
                tracing::debug!(table, id, "nothing to delete");
                false
            }
            Ok(_) => {
                tracing::debug!(table, id, "record deleted");
                self.refresh_data(false);
                true
            }
            Err(err) if err.constraint_kind().is_some_and(|k| k.is_reference()) => {
                let name = match self.connection.query_scalar(name_sql, &[Value::Int64(id)]) {
                    Ok(name) if !name.is_null() => name.to_string(),
                    Ok(_) => format!("#{}", id),
                    Err(lookup) => {
                        tracing::warn!(table, id, error = %lookup, "name lookup failed");
                        format!("#{}", id)
                    }
                };
                self.emit_error(in_use(&name));
                false
            }
            Err(err) => {
                self.report_error(&err);
                false
            }
        }
    }

    /// Insert and return the new rowid, publishing failures
    pub(crate) fn insert(
        &self,
        sql: &str,
        params: &[Value],
        on_constraint: impl FnOnce(&MrtpError) -> Option<String>,
    ) -> Option<i64> {
        match self.execute(sql, params) {
            Ok(StatementResult {
                last_insert_id: Some(id),
                ..
            }) if id != 0 => Some(id),
            Ok(_) => {
                self.emit_error(crate::messages::generic_text("record was not inserted"));
                None
            }
            Err(err) => {
                match on_constraint(&err) {
                    Some(message) => self.emit_error(message),
                    None => self.report_error(&err),
                }
                None
            }
        }
    }

    /// Run an UPDATE, publishing failures. `on_constraint` may map a
    /// constraint violation to a column-aware message.
    ///
    /// An UPDATE that touches no row means the cached record was deleted
    /// behind the model's back; it fails and the caller leaves the cache alone.
    pub(crate) fn update(
        &self,
        sql: &str,
        params: &[Value],
        on_constraint: impl FnOnce(&MrtpError) -> Option<String>,
    ) -> bool {
        match self.execute(sql, params) {
            Ok(res) if res.affected_rows == 0 => {
                tracing::debug!(table = ?self.query.kind(), "update matched no row");
                self.emit_error(crate::messages::record_gone());
                false
            }
            Ok(_) => true,
            Err(err) => {
                match on_constraint(&err) {
                    Some(message) => self.emit_error(message),
                    None => self.report_error(&err),
                }
                false
            }
        }
    }
}

impl<Q: TableQuery + std::fmt::Debug> std::fmt::Debug for PagedModel<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedModel")
            .field("query", &self.query)
            .field("paging", &self.paging)
            .field("cached", &self.cache.range())
            .field("sort_column", &self.sort_column)
            .field("filters", &self.filters)
            .finish()
    }
}
