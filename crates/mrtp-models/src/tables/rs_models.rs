//! Rolling stock models (a model is a class of identical vehicles)

use mrtp_core::{Result, Row, TableKind, Value};

use super::simplified;
use crate::filter::FilterFlags;
use crate::messages;
use crate::paged::PagedModel;
use crate::session::{SessionContext, SessionEvent};
use crate::table::{ColumnDef, TableQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RsType {
    #[default]
    Engine,
    FreightWagon,
    Coach,
}

impl RsType {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Engine),
            1 => Some(Self::FreightWagon),
            2 => Some(Self::Coach),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Engine => "Engine",
            Self::FreightWagon => "Freight Wagon",
            Self::Coach => "Coach",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsModelItem {
    pub id: i64,
    pub name: String,
    pub suffix: String,
    pub max_speed: i64,
    pub axes: i64,
    pub rs_type: RsType,
    pub sub_type: i64,
}

/// Values for a new model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRsModel {
    pub name: String,
    pub suffix: String,
    pub max_speed: i64,
    pub axes: i64,
    pub rs_type: RsType,
    pub sub_type: i64,
}

impl NewRsModel {
    pub fn new(name: impl Into<String>, rs_type: RsType) -> Self {
        Self {
            name: name.into(),
            suffix: String::new(),
            max_speed: 120,
            axes: 4,
            rs_type,
            sub_type: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RsModelsTable;

impl RsModelsTable {
    pub const NAME: usize = 0;
    pub const SUFFIX: usize = 1;
    pub const MAX_SPEED: usize = 2;
    pub const AXES: usize = 3;
    pub const TYPE: usize = 4;
}

static COLUMNS: [ColumnDef; 5] = [
    ColumnDef::new("Name")
        .filterable(FilterFlags::BASIC, &["name"])
        .sortable("name, suffix"),
    ColumnDef::new("Suffix").filterable(FilterFlags::BASIC, &["suffix"]),
    ColumnDef::new("Max Speed").sortable("max_speed").tooltip("km/h"),
    ColumnDef::new("Axes").sortable("axes"),
    ColumnDef::new("Type").sortable("type, sub_type, name"),
];

impl TableQuery for RsModelsTable {
    type Item = RsModelItem;

    fn kind(&self) -> TableKind {
        TableKind::RsModels
    }

    fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
    }

    fn default_sort_column(&self) -> usize {
        Self::NAME
    }

    fn select_list(&self) -> &'static str {
        "id, name, suffix, max_speed, axes, type, sub_type"
    }

    fn from_clause(&self) -> &'static str {
        "rs_models"
    }

    fn id_expr(&self) -> &'static str {
        "id"
    }

    fn decode_row(&self, row: &Row) -> Result<RsModelItem> {
        Ok(RsModelItem {
            id: row.int(0)?,
            name: row.text(1)?,
            suffix: row.text(2)?,
            max_speed: row.int(3)?,
            axes: row.int(4)?,
            rs_type: RsType::from_i64(row.int(5)?).unwrap_or_default(),
            sub_type: row.int(6)?,
        })
    }

    fn cell(&self, item: &RsModelItem, column: usize) -> Value {
        match column {
            Self::NAME => Value::from(item.name.as_str()),
            Self::SUFFIX => Value::from(item.suffix.as_str()),
            Self::MAX_SPEED => Value::Int64(item.max_speed),
            Self::AXES => Value::Int64(item.axes),
            Self::TYPE => Value::from(item.rs_type.label()),
            _ => Value::Null,
        }
    }

    fn sort_depends_on(&self, sort_column: usize, edited: usize) -> bool {
        sort_column == edited || (edited == Self::NAME && sort_column == Self::TYPE)
    }
}

pub type RsModelsModel = PagedModel<RsModelsTable>;

impl PagedModel<RsModelsTable> {
    pub fn new(ctx: &SessionContext) -> Self {
        Self::with_query(ctx, RsModelsTable)
    }

    pub fn add_model(&mut self, model: &NewRsModel) -> Option<i64> {
        let name = simplified(&model.name);
        let suffix = simplified(&model.suffix);
        if name.is_empty() {
            return None;
        }

        let id = self.insert(
            "INSERT INTO rs_models (name, suffix, max_speed, axes, type, sub_type) \
             VALUES (?, ?, ?, ?, ?, ?)",
            &[
                Value::from(name.as_str()),
                Value::from(suffix.as_str()),
                Value::Int64(model.max_speed),
                Value::Int64(model.axes),
                Value::Int64(model.rs_type.as_i64()),
                Value::Int64(model.sub_type),
            ],
            |err| {
                err.is_unique_violation_on("name")
                    .then(|| messages::name_already_used("model", &display_name(&name, &suffix)))
            },
        )?;
        tracing::debug!(id, name = %name, "model added");

        self.refresh_data(false);
        Some(id)
    }

    pub fn remove_model(&mut self, id: i64) -> bool {
        let removed = self.delete_record(
            "rs_models",
            id,
            "SELECT name || suffix FROM rs_models WHERE id = ?",
            |name| messages::still_referenced("model", name),
        );
        if removed {
            self.publish(SessionEvent::ModelRemoved(id));
        }
        removed
    }

    /// Rename keeping the suffix; `(name, suffix)` must stay unique
    pub fn set_model_name(&mut self, row: usize, name: &str) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        let id = item.id;
        let name = simplified(name);
        if name.is_empty() || item.name == name {
            return false;
        }
        let label = display_name(&name, &item.suffix);

        let ok = self.update(
            "UPDATE rs_models SET name = ? WHERE id = ?",
            &[Value::from(name.as_str()), Value::Int64(id)],
            |err| {
                err.is_unique_violation_on("name")
                    .then(|| messages::name_already_used("model", &label))
            },
        );
        if !ok {
            return false;
        }
        self.commit_edit(row, RsModelsTable::NAME, |item| item.name = name);
        true
    }
}

fn display_name(name: &str, suffix: &str) -> String {
    format!("{}{}", name, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rs_type_storage_codes() {
        assert_eq!(RsType::from_i64(1), Some(RsType::FreightWagon));
        assert_eq!(RsType::Coach.as_i64(), 2);
        assert_eq!(RsType::from_i64(-1), None);
    }

    #[test]
    fn renaming_resorts_type_column() {
        assert!(RsModelsTable.sort_depends_on(RsModelsTable::TYPE, RsModelsTable::NAME));
        assert!(!RsModelsTable.sort_depends_on(RsModelsTable::AXES, RsModelsTable::NAME));
    }
}
