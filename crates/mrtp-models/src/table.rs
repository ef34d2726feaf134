//! Per-table query description consumed by [`crate::PagedModel`]

use mrtp_core::{Result, Row, TableKind, Value};

use crate::filter::FilterFlags;

/// Static description of one displayed column
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub header: &'static str,
    pub tooltip: Option<&'static str>,
    pub filter: FilterFlags,
    /// SQL expressions a filter on this column matches against (ORed)
    pub filter_exprs: &'static [&'static str],
    /// ORDER BY expression when sorting by this column, `None` if not sortable
    pub sort_expr: Option<&'static str>,
}

impl ColumnDef {
    pub const fn new(header: &'static str) -> Self {
        Self {
            header,
            tooltip: None,
            filter: FilterFlags::empty(),
            filter_exprs: &[],
            sort_expr: None,
        }
    }

    pub const fn filterable(self, flags: FilterFlags, exprs: &'static [&'static str]) -> Self {
        Self {
            filter: flags,
            filter_exprs: exprs,
            ..self
        }
    }

    pub const fn sortable(self, expr: &'static str) -> Self {
        Self {
            sort_expr: Some(expr),
            ..self
        }
    }

    pub const fn tooltip(self, text: &'static str) -> Self {
        Self {
            tooltip: Some(text),
            ..self
        }
    }

    pub fn is_sortable(&self) -> bool {
        self.sort_expr.is_some()
    }
}

/// Query builder and row codec for one table.
///
/// The model composes `SELECT {select_list} FROM {from_clause} WHERE ...
/// ORDER BY {sort_expr}, {id_expr} LIMIT ? OFFSET ?`, and the matching
/// `SELECT COUNT(1)` for the row count.
pub trait TableQuery {
    type Item: Clone + std::fmt::Debug;

    fn kind(&self) -> TableKind;

    fn columns(&self) -> &'static [ColumnDef];

    fn default_sort_column(&self) -> usize;

    fn select_list(&self) -> &'static str;

    fn from_clause(&self) -> &'static str;

    /// Primary key expression, appended to every ORDER BY as final tie-break
    fn id_expr(&self) -> &'static str;

    fn decode_row(&self, row: &Row) -> Result<Self::Item>;

    fn cell(&self, item: &Self::Item, column: usize) -> Value;

    /// Whether editing `edited` can move a row when sorted by `sort_column`
    fn sort_depends_on(&self, sort_column: usize, edited: usize) -> bool {
        sort_column == edited
    }
}
