//! Concrete table models of a layout

mod lines;
mod rollingstock;
mod rs_models;
mod rs_owners;
mod segments;
mod stations;

pub use lines::{LineItem, LinesModel, LinesTable};
pub use rollingstock::{RollingstockItem, RollingstockModel, RollingstockTable};
pub use rs_models::{NewRsModel, RsModelItem, RsModelsModel, RsModelsTable, RsType};
pub use rs_owners::{RsOwnerItem, RsOwnersModel, RsOwnersTable};
pub use segments::{NewSegment, SegmentItem, SegmentsModel, SegmentsTable};
pub use stations::{StationItem, StationType, StationsModel, StationsTable};

use mrtp_core::Value;

use crate::messages;
use crate::paged::PagedModel;
use crate::table::TableQuery;

/// Trim and collapse internal whitespace runs to a single space
pub(crate) fn simplified(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a length in meters as kilometers with three decimals
pub(crate) fn format_km(meters: i64) -> String {
    format!("{}.{:03}", meters / 1000, (meters % 1000).abs())
}

impl<Q: TableQuery> PagedModel<Q> {
    /// `UPDATE {table} SET name = ? WHERE id = ?`, mapping a UNIQUE failure on
    /// `name` to the "already used by another {entity}" text
    pub(crate) fn update_name(&self, table: &str, id: i64, name: &str, entity: &str) -> bool {
        let sql = format!("UPDATE {} SET name = ? WHERE id = ?", table);
        self.update(&sql, &[Value::from(name), Value::Int64(id)], |err| {
            err.is_unique_violation_on("name")
                .then(|| messages::name_already_used(entity, name))
        })
    }

    /// Insert a record holding only a unique `name`
    pub(crate) fn insert_named(&self, sql: &str, name: &str, entity: &str) -> Option<i64> {
        self.insert(sql, &[Value::from(name)], |err| {
            err.is_unique_violation_on("name")
                .then(|| messages::name_already_used(entity, name))
        })
    }
}
