//! Rolling stock pieces: one row per numbered vehicle of a model

use mrtp_core::{Result, Row, TableKind, Value};

use super::RsType;
use crate::filter::FilterFlags;
use crate::messages;
use crate::paged::PagedModel;
use crate::session::{SessionContext, SessionEvent};
use crate::table::{ColumnDef, TableQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingstockItem {
    pub id: i64,
    pub model_id: i64,
    pub model: String,
    pub suffix: String,
    pub number: i64,
    pub owner_id: Option<i64>,
    pub owner: Option<String>,
    pub rs_type: RsType,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollingstockTable;

impl RollingstockTable {
    pub const MODEL: usize = 0;
    pub const NUMBER: usize = 1;
    pub const SUFFIX: usize = 2;
    pub const OWNER: usize = 3;
    pub const TYPE: usize = 4;
}

static COLUMNS: [ColumnDef; 5] = [
    ColumnDef::new("Model")
        .filterable(FilterFlags::BASIC, &["m.name"])
        .sortable("m.name, r.number"),
    ColumnDef::new("Number"),
    ColumnDef::new("Suffix"),
    ColumnDef::new("Owner")
        .filterable(
            FilterFlags::BASIC.union(FilterFlags::EXPLICIT_NULL),
            &["o.name"],
        )
        .sortable("o.name, m.name, r.number")
        .tooltip("Use #NULL to list rollingstock without owner"),
    ColumnDef::new("Type").sortable("m.type, m.name, r.number"),
];

impl TableQuery for RollingstockTable {
    type Item = RollingstockItem;

    fn kind(&self) -> TableKind {
        TableKind::Rollingstock
    }

    fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
    }

    fn default_sort_column(&self) -> usize {
        Self::MODEL
    }

    fn select_list(&self) -> &'static str {
        "r.id, r.model_id, m.name, m.suffix, r.number, r.owner_id, o.name, m.type"
    }

    fn from_clause(&self) -> &'static str {
        "rs_list r \
         JOIN rs_models m ON m.id = r.model_id \
         LEFT JOIN rs_owners o ON o.id = r.owner_id"
    }

    fn id_expr(&self) -> &'static str {
        "r.id"
    }

    fn decode_row(&self, row: &Row) -> Result<RollingstockItem> {
        Ok(RollingstockItem {
            id: row.int(0)?,
            model_id: row.int(1)?,
            model: row.text(2)?,
            suffix: row.text(3)?,
            number: row.int(4)?,
            owner_id: row.opt_int(5)?,
            owner: row.opt_text(6)?,
            rs_type: RsType::from_i64(row.int(7)?).unwrap_or_default(),
        })
    }

    fn cell(&self, item: &RollingstockItem, column: usize) -> Value {
        match column {
            Self::MODEL => Value::from(item.model.as_str()),
            Self::NUMBER => Value::Int64(item.number),
            Self::SUFFIX => Value::from(item.suffix.as_str()),
            Self::OWNER => Value::from(item.owner.clone()),
            Self::TYPE => Value::from(item.rs_type.label()),
            _ => Value::Null,
        }
    }

    /// Every sort key ends with the number
    fn sort_depends_on(&self, sort_column: usize, edited: usize) -> bool {
        sort_column == edited || edited == Self::NUMBER
    }
}

pub type RollingstockModel = PagedModel<RollingstockTable>;

impl PagedModel<RollingstockTable> {
    pub fn new(ctx: &SessionContext) -> Self {
        Self::with_query(ctx, RollingstockTable)
    }

    #[tracing::instrument(skip(self))]
    pub fn add_rollingstock(
        &mut self,
        model_id: i64,
        number: i64,
        owner_id: Option<i64>,
    ) -> Option<i64> {
        if number < 0 {
            return None;
        }
        let model = self.model_name(model_id)?;

        let id = self.insert(
            "INSERT INTO rs_list (model_id, number, owner_id) VALUES (?, ?, ?)",
            &[
                Value::Int64(model_id),
                Value::Int64(number),
                Value::from(owner_id),
            ],
            |err| {
                err.is_unique_violation_on("number")
                    .then(|| messages::number_already_used(&model, number))
            },
        )?;

        self.refresh_data(false);
        Some(id)
    }

    pub fn remove_rollingstock(&mut self, id: i64) -> bool {
        let removed = self.delete_record(
            "rs_list",
            id,
            "SELECT m.name || ' ' || r.number FROM rs_list r \
             JOIN rs_models m ON m.id = r.model_id WHERE r.id = ?",
            |name| messages::still_referenced("rollingstock", name),
        );
        if removed {
            self.publish(SessionEvent::RollingstockRemoved(id));
        }
        removed
    }

    pub fn set_number(&mut self, row: usize, number: i64) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        if number < 0 || item.number == number {
            return false;
        }
        let id = item.id;
        let model = item.model.clone();

        let ok = self.update(
            "UPDATE rs_list SET number = ? WHERE id = ?",
            &[Value::Int64(number), Value::Int64(id)],
            |err| {
                err.is_unique_violation_on("number")
                    .then(|| messages::number_already_used(&model, number))
            },
        );
        if ok {
            self.commit_edit(row, RollingstockTable::NUMBER, |item| item.number = number);
        }
        ok
    }

    /// Assign `owner_id`, or clear the owner with `None`
    pub fn set_owner(&mut self, row: usize, owner_id: Option<i64>) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        if item.owner_id == owner_id {
            return false;
        }
        let id = item.id;

        let owner = match owner_id {
            Some(owner_id) => {
                match self
                    .connection
                    .query_scalar("SELECT name FROM rs_owners WHERE id = ?", &[Value::Int64(owner_id)])
                {
                    Ok(Value::String(name)) => Some(name),
                    Ok(_) => {
                        self.emit_error(messages::generic_text("owner does not exist"));
                        return false;
                    }
                    Err(err) => {
                        self.report_error(&err);
                        return false;
                    }
                }
            }
            None => None,
        };

        let ok = self.update(
            "UPDATE rs_list SET owner_id = ? WHERE id = ?",
            &[Value::from(owner_id), Value::Int64(id)],
            |_| None,
        );
        if ok {
            self.commit_edit(row, RollingstockTable::OWNER, |item| {
                item.owner_id = owner_id;
                item.owner = owner;
            });
        }
        ok
    }

    fn model_name(&self, model_id: i64) -> Option<String> {
        match self
            .connection
            .query_scalar("SELECT name FROM rs_models WHERE id = ?", &[Value::Int64(model_id)])
        {
            Ok(Value::String(name)) => Some(name),
            Ok(_) => {
                self.emit_error(messages::generic_text("model does not exist"));
                None
            }
            Err(err) => {
                self.report_error(&err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_edits_invalidate_every_sort() {
        for sort in [
            RollingstockTable::MODEL,
            RollingstockTable::OWNER,
            RollingstockTable::TYPE,
        ] {
            assert!(RollingstockTable.sort_depends_on(sort, RollingstockTable::NUMBER));
        }
        assert!(!RollingstockTable.sort_depends_on(RollingstockTable::MODEL, RollingstockTable::OWNER));
    }

    #[test]
    fn owner_accepts_null_filter() {
        assert!(COLUMNS[RollingstockTable::OWNER]
            .filter
            .contains(FilterFlags::EXPLICIT_NULL));
        assert!(!COLUMNS[RollingstockTable::NUMBER].is_sortable());
    }
}
