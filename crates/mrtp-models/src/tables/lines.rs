//! Railway lines: ordered chains of segments

use mrtp_core::{Result, Row, TableKind, Value};

use super::{format_km, simplified};
use crate::event::ModelEvent;
use crate::filter::FilterFlags;
use crate::messages;
use crate::paged::PagedModel;
use crate::session::{SessionContext, SessionEvent};
use crate::table::{ColumnDef, TableQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub id: i64,
    pub name: String,
    /// Kilometric position of the line origin
    pub start_meters: i64,
    pub segment_count: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinesTable;

impl LinesTable {
    pub const NAME: usize = 0;
    pub const START_KM: usize = 1;
    pub const SEGMENTS: usize = 2;
}

static COLUMNS: [ColumnDef; 3] = [
    ColumnDef::new("Name")
        .filterable(FilterFlags::BASIC, &["l.name"])
        .sortable("l.name"),
    ColumnDef::new("Start km").sortable("l.start_meters"),
    ColumnDef::new("Segments"),
];

impl TableQuery for LinesTable {
    type Item = LineItem;

    fn kind(&self) -> TableKind {
        TableKind::Lines
    }

    fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
    }

    fn default_sort_column(&self) -> usize {
        Self::NAME
    }

    fn select_list(&self) -> &'static str {
        "l.id, l.name, l.start_meters, \
         (SELECT COUNT(1) FROM line_segments ls WHERE ls.line_id = l.id)"
    }

    fn from_clause(&self) -> &'static str {
        "lines l"
    }

    fn id_expr(&self) -> &'static str {
        "l.id"
    }

    fn decode_row(&self, row: &Row) -> Result<LineItem> {
        Ok(LineItem {
            id: row.int(0)?,
            name: row.text(1)?,
            start_meters: row.int(2)?,
            segment_count: row.int(3)?,
        })
    }

    fn cell(&self, item: &LineItem, column: usize) -> Value {
        match column {
            Self::NAME => Value::from(item.name.as_str()),
            Self::START_KM => Value::String(format_km(item.start_meters)),
            Self::SEGMENTS => Value::Int64(item.segment_count),
            _ => Value::Null,
        }
    }
}

pub type LinesModel = PagedModel<LinesTable>;

impl PagedModel<LinesTable> {
    pub fn new(ctx: &SessionContext) -> Self {
        Self::with_query(ctx, LinesTable)
    }

    pub fn add_line(&mut self, name: &str) -> Option<i64> {
        let name = simplified(name);
        if name.is_empty() {
            return None;
        }
        let id = self.insert_named("INSERT INTO lines (name) VALUES (?)", &name, "line")?;
        tracing::debug!(id, name = %name, "line added");
        self.refresh_data(false);
        Some(id)
    }

    /// Deleting a line also drops its segment chain
    pub fn remove_line(&mut self, id: i64) -> bool {
        let removed = self.delete_record(
            "lines",
            id,
            "SELECT name FROM lines WHERE id = ?",
            |name| messages::still_referenced("line", name),
        );
        if removed {
            self.publish(SessionEvent::LineRemoved(id));
        }
        removed
    }

    pub fn set_line_name(&mut self, row: usize, name: &str) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        let id = item.id;
        let name = simplified(name);
        if name.is_empty() || item.name == name {
            return false;
        }

        if !self.update_name("lines", id, &name, "line") {
            return false;
        }
        self.commit_edit(row, LinesTable::NAME, |item| item.name = name);
        true
    }

    /// Append segment `segment_id` at the end of line `line_id`
    pub fn add_line_segment(&mut self, line_id: i64, segment_id: i64) -> bool {
        let ok = self.update(
            "INSERT INTO line_segments (line_id, seg_id, pos) \
             SELECT ?1, ?2, COALESCE(MAX(pos) + 1, 0) FROM line_segments WHERE line_id = ?1",
            &[Value::Int64(line_id), Value::Int64(segment_id)],
            |err| {
                err.is_unique_violation_on("seg_id")
                    .then(|| "Segment is already part of this line.".to_string())
            },
        );
        if !ok {
            return false;
        }

        if let Some(row) = self.find_cached(|item| item.id == line_id) {
            if let Some(item) = self.cached_row_mut(row) {
                item.segment_count += 1;
            }
            self.events().emit(&ModelEvent::DataChanged {
                first: row,
                last: row,
            });
        }
        true
    }
}
