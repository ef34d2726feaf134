//! Railway segments between two stations

use mrtp_core::{Result, Row, TableKind, Value};

use super::{format_km, simplified};
use crate::filter::FilterFlags;
use crate::messages;
use crate::paged::PagedModel;
use crate::session::{SessionContext, SessionEvent};
use crate::table::{ColumnDef, TableQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentItem {
    pub id: i64,
    pub name: String,
    pub from_station_id: i64,
    pub from_station: String,
    pub to_station_id: i64,
    pub to_station: String,
    pub max_speed_kmh: i64,
    pub distance_meters: i64,
    pub electrified: bool,
}

/// Values for a new segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSegment {
    pub name: String,
    pub from_station_id: i64,
    pub to_station_id: i64,
    pub max_speed_kmh: i64,
    pub distance_meters: i64,
    pub electrified: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentsTable;

impl SegmentsTable {
    pub const NAME: usize = 0;
    pub const FROM: usize = 1;
    pub const TO: usize = 2;
    pub const MAX_SPEED: usize = 3;
    pub const DISTANCE: usize = 4;
    pub const ELECTRIFIED: usize = 5;
}

static COLUMNS: [ColumnDef; 6] = [
    ColumnDef::new("Name")
        .filterable(FilterFlags::BASIC, &["s.name"])
        .sortable("s.name"),
    ColumnDef::new("From")
        .filterable(FilterFlags::BASIC, &["a.name"])
        .sortable("a.name, s.name"),
    ColumnDef::new("To")
        .filterable(FilterFlags::BASIC, &["b.name"])
        .sortable("b.name, s.name"),
    ColumnDef::new("Max Speed")
        .sortable("s.max_speed_kmh")
        .tooltip("km/h"),
    ColumnDef::new("Distance")
        .sortable("s.distance_meters")
        .tooltip("km"),
    ColumnDef::new("Electrified"),
];

impl TableQuery for SegmentsTable {
    type Item = SegmentItem;

    fn kind(&self) -> TableKind {
        TableKind::Segments
    }

    fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
    }

    fn default_sort_column(&self) -> usize {
        Self::NAME
    }

    fn select_list(&self) -> &'static str {
        "s.id, s.name, s.from_station_id, a.name, s.to_station_id, b.name, \
         s.max_speed_kmh, s.distance_meters, s.electrified"
    }

    fn from_clause(&self) -> &'static str {
        "railway_segments s \
         JOIN stations a ON a.id = s.from_station_id \
         JOIN stations b ON b.id = s.to_station_id"
    }

    fn id_expr(&self) -> &'static str {
        "s.id"
    }

    fn decode_row(&self, row: &Row) -> Result<SegmentItem> {
        Ok(SegmentItem {
            id: row.int(0)?,
            name: row.text(1)?,
            from_station_id: row.int(2)?,
            from_station: row.text(3)?,
            to_station_id: row.int(4)?,
            to_station: row.text(5)?,
            max_speed_kmh: row.int(6)?,
            distance_meters: row.int(7)?,
            electrified: row.int(8)? != 0,
        })
    }

    fn cell(&self, item: &SegmentItem, column: usize) -> Value {
        match column {
            Self::NAME => Value::from(item.name.as_str()),
            Self::FROM => Value::from(item.from_station.as_str()),
            Self::TO => Value::from(item.to_station.as_str()),
            Self::MAX_SPEED => Value::Int64(item.max_speed_kmh),
            Self::DISTANCE => Value::String(format_km(item.distance_meters)),
            Self::ELECTRIFIED => Value::Bool(item.electrified),
            _ => Value::Null,
        }
    }

    fn sort_depends_on(&self, sort_column: usize, edited: usize) -> bool {
        sort_column == edited
            || (edited == Self::NAME && matches!(sort_column, Self::FROM | Self::TO))
    }
}

pub type SegmentsModel = PagedModel<SegmentsTable>;

impl PagedModel<SegmentsTable> {
    pub fn new(ctx: &SessionContext) -> Self {
        Self::with_query(ctx, SegmentsTable)
    }

    #[tracing::instrument(skip(self), fields(name = %segment.name))]
    pub fn add_segment(&mut self, segment: &NewSegment) -> Option<i64> {
        let name = simplified(&segment.name);
        if name.is_empty() || segment.from_station_id == segment.to_station_id {
            return None;
        }

        let id = self.insert(
            "INSERT INTO railway_segments \
             (name, from_station_id, to_station_id, max_speed_kmh, distance_meters, electrified) \
             VALUES (?, ?, ?, ?, ?, ?)",
            &[
                Value::from(name.as_str()),
                Value::Int64(segment.from_station_id),
                Value::Int64(segment.to_station_id),
                Value::Int64(segment.max_speed_kmh),
                Value::Int64(segment.distance_meters),
                Value::Bool(segment.electrified),
            ],
            |err| {
                err.is_unique_violation_on("name")
                    .then(|| messages::name_already_used("segment", &name))
            },
        )?;

        self.refresh_data(false);
        Some(id)
    }

    pub fn remove_segment(&mut self, id: i64) -> bool {
        let removed = self.delete_record(
            "railway_segments",
            id,
            "SELECT name FROM railway_segments WHERE id = ?",
            |name| messages::still_referenced("segment", name),
        );
        if removed {
            self.publish(SessionEvent::SegmentRemoved(id));
        }
        removed
    }

    pub fn set_segment_name(&mut self, row: usize, name: &str) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        let id = item.id;
        let name = simplified(name);
        if name.is_empty() || item.name == name {
            return false;
        }

        if !self.update_name("railway_segments", id, &name, "segment") {
            return false;
        }
        self.commit_edit(row, SegmentsTable::NAME, |item| item.name = name);
        true
    }
}
