//! Stations table

use mrtp_core::{Result, Row, TableKind, Value};

use super::simplified;
use crate::filter::FilterFlags;
use crate::messages;
use crate::paged::PagedModel;
use crate::session::{SessionContext, SessionEvent};
use crate::table::{ColumnDef, TableQuery};

/// Role of a station on the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StationType {
    #[default]
    Normal,
    /// Trains may stop but not start or terminate here
    SimpleStop,
    /// Junction between lines, not a real station
    Junction,
}

impl StationType {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::SimpleStop),
            2 => Some(Self::Junction),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::SimpleStop => "Simple stop",
            Self::Junction => "Junction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationItem {
    pub id: i64,
    pub name: String,
    pub short_name: Option<String>,
    pub station_type: StationType,
    pub phone_number: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StationsTable;

impl StationsTable {
    pub const NAME: usize = 0;
    pub const SHORT_NAME: usize = 1;
    pub const TYPE: usize = 2;
    pub const PHONE: usize = 3;
}

static COLUMNS: [ColumnDef; 4] = [
    ColumnDef::new("Name")
        .filterable(FilterFlags::BASIC, &["name", "short_name"])
        .sortable("name")
        .tooltip("Filter matches name and short name"),
    ColumnDef::new("Short Name"),
    ColumnDef::new("Type").sortable("type, name"),
    ColumnDef::new("Phone")
        .filterable(
            FilterFlags::BASIC.union(FilterFlags::EXPLICIT_NULL),
            &["phone_number"],
        )
        .tooltip("Use #NULL to list stations without a phone number"),
];

impl TableQuery for StationsTable {
    type Item = StationItem;

    fn kind(&self) -> TableKind {
        TableKind::Stations
    }

    fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
    }

    fn default_sort_column(&self) -> usize {
        Self::NAME
    }

    fn select_list(&self) -> &'static str {
        "id, name, short_name, type, phone_number"
    }

    fn from_clause(&self) -> &'static str {
        "stations"
    }

    fn id_expr(&self) -> &'static str {
        "id"
    }

    fn decode_row(&self, row: &Row) -> Result<StationItem> {
        Ok(StationItem {
            id: row.int(0)?,
            name: row.text(1)?,
            short_name: row.opt_text(2)?,
            station_type: StationType::from_i64(row.int(3)?).unwrap_or_default(),
            phone_number: row.opt_int(4)?,
        })
    }

    fn cell(&self, item: &StationItem, column: usize) -> Value {
        match column {
            Self::NAME => Value::from(item.name.as_str()),
            Self::SHORT_NAME => Value::from(item.short_name.clone()),
            Self::TYPE => Value::from(item.station_type.label()),
            Self::PHONE => Value::from(item.phone_number),
            _ => Value::Null,
        }
    }

    fn sort_depends_on(&self, sort_column: usize, edited: usize) -> bool {
        sort_column == edited || (sort_column == Self::TYPE && edited == Self::NAME)
    }
}

pub type StationsModel = PagedModel<StationsTable>;

impl PagedModel<StationsTable> {
    pub fn new(ctx: &SessionContext) -> Self {
        Self::with_query(ctx, StationsTable)
    }

    /// Insert a station named `name` and show it: filters are cleared,
    /// sorting returns to Name and the first page becomes current.
    #[tracing::instrument(skip(self))]
    pub fn add_station(&mut self, name: &str) -> Option<i64> {
        let name = simplified(name);
        if name.is_empty() {
            return None;
        }
        // Rowids start at 1, so no existing station counts as "this one"
        if !self.check_not_short_name(0, &name) {
            return None;
        }

        let id = self.insert(
            "INSERT INTO stations (name, short_name, type, phone_number, svg_data) \
             VALUES (?, NULL, 0, NULL, NULL)",
            &[Value::from(name.as_str())],
            |err| {
                err.is_unique_violation_on("name")
                    .then(|| messages::name_already_used("station", &name))
            },
        )?;
        tracing::debug!(id, "station added");

        self.clear_filters();
        self.refresh_data(true);
        self.set_sorting_column(StationsTable::NAME);
        self.switch_to_page(0);
        Some(id)
    }

    pub fn remove_station(&mut self, id: i64) -> bool {
        let removed = self.delete_record(
            "stations",
            id,
            "SELECT name FROM stations WHERE id = ?",
            messages::station_in_use,
        );
        if removed {
            self.publish(SessionEvent::StationRemoved(id));
        }
        removed
    }

    /// Rename the station at `row`. The row must be cached.
    pub fn set_name(&mut self, row: usize, name: &str) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        let id = item.id;
        let name = simplified(name);
        if name.is_empty() || item.name == name {
            return false;
        }

        if !self.check_not_short_name(id, &name) {
            return false;
        }
        if !self.update_name("stations", id, &name, "station") {
            return false;
        }

        self.commit_edit(row, StationsTable::NAME, |item| item.name = name);
        self.publish(SessionEvent::StationNameChanged(id));
        true
    }

    /// Set or clear (empty text) the short name of the station at `row`
    pub fn set_short_name(&mut self, row: usize, short_name: &str) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        let id = item.id;
        let short_name = simplified(short_name);
        if item.short_name.as_deref().unwrap_or("") == short_name {
            return false;
        }

        if !short_name.is_empty() && !self.check_not_name(id, &short_name) {
            return false;
        }

        let value = (!short_name.is_empty()).then(|| short_name.clone());
        let ok = self.update(
            "UPDATE stations SET short_name = ? WHERE id = ?",
            &[Value::from(value.clone()), Value::Int64(id)],
            |err| {
                err.is_unique_violation_on("short_name")
                    .then(|| messages::short_name_already_used(&short_name, ""))
            },
        );
        if !ok {
            return false;
        }

        self.commit_edit(row, StationsTable::SHORT_NAME, |item| {
            item.short_name = value
        });
        self.publish(SessionEvent::StationNameChanged(id));
        true
    }

    pub fn set_station_type(&mut self, row: usize, station_type: StationType) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        if item.station_type == station_type {
            return false;
        }
        let id = item.id;

        let ok = self.update(
            "UPDATE stations SET type = ? WHERE id = ?",
            &[Value::Int64(station_type.as_i64()), Value::Int64(id)],
            |_| None,
        );
        if ok {
            self.commit_edit(row, StationsTable::TYPE, |item| {
                item.station_type = station_type
            });
        }
        ok
    }

    /// Set the phone number; `None` or a negative number removes it
    pub fn set_phone_number(&mut self, row: usize, number: Option<i64>) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        let number = number.filter(|n| *n >= 0);
        if item.phone_number == number {
            return false;
        }
        let id = item.id;

        let ok = self.update(
            "UPDATE stations SET phone_number = ? WHERE id = ?",
            &[Value::from(number), Value::Int64(id)],
            |err| {
                err.is_unique_violation_on("phone_number")
                    .then(|| messages::phone_already_used(number.unwrap_or_default()))
            },
        );
        if ok {
            self.commit_edit(row, StationsTable::PHONE, |item| {
                item.phone_number = number
            });
        }
        ok
    }

    /// A name must not be the short name of any station
    fn check_not_short_name(&self, id: i64, name: &str) -> bool {
        self.check_name_clash("SELECT id, name FROM stations WHERE short_name = ?", id, name)
    }

    /// A short name must not be the name of any station
    fn check_not_name(&self, id: i64, short_name: &str) -> bool {
        self.check_name_clash("SELECT id, name FROM stations WHERE name = ?", id, short_name)
    }

    fn check_name_clash(&self, sql: &str, id: i64, text: &str) -> bool {
        match self.connection.query_row(sql, &[Value::from(text)]) {
            Ok(None) => true,
            Ok(Some(row)) => {
                let message = if row.int(0).ok() == Some(id) {
                    messages::name_equals_short_name(text)
                } else {
                    let other = row.text(1).unwrap_or_default();
                    messages::short_name_already_used(text, &other)
                };
                self.emit_error(message);
                false
            }
            Err(err) => {
                self.report_error(&err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn station_type_round_trips_through_storage_code() {
        for ty in [StationType::Normal, StationType::SimpleStop, StationType::Junction] {
            assert_eq!(StationType::from_i64(ty.as_i64()), Some(ty));
        }
        assert_eq!(StationType::from_i64(3), None);
    }

    #[test]
    fn decodes_nullable_columns() {
        let columns: Arc<[String]> = ["id", "name", "short_name", "type", "phone_number"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let row = Row::new(
            columns,
            vec![
                Value::Int64(4),
                Value::from("Milano Centrale"),
                Value::Null,
                Value::Int64(2),
                Value::Null,
            ],
        );
        let item = StationsTable.decode_row(&row).unwrap();
        assert_eq!(item.short_name, None);
        assert_eq!(item.station_type, StationType::Junction);
        assert_eq!(StationsTable.cell(&item, StationsTable::PHONE), Value::Null);
        assert_eq!(
            StationsTable.cell(&item, StationsTable::TYPE),
            Value::from("Junction")
        );
    }

    #[test]
    fn renaming_moves_rows_sorted_by_type() {
        assert!(StationsTable.sort_depends_on(StationsTable::TYPE, StationsTable::NAME));
        assert!(StationsTable.sort_depends_on(StationsTable::NAME, StationsTable::NAME));
        assert!(!StationsTable.sort_depends_on(StationsTable::NAME, StationsTable::PHONE));
    }

    #[test]
    fn only_name_and_phone_are_filterable() {
        let filterable: Vec<&str> = COLUMNS
            .iter()
            .filter(|c| !c.filter.is_empty())
            .map(|c| c.header)
            .collect();
        assert_eq!(filterable, vec!["Name", "Phone"]);
        assert!(COLUMNS[StationsTable::PHONE]
            .filter
            .contains(FilterFlags::EXPLICIT_NULL));
    }
}
