//! Rolling stock owners

use mrtp_core::{Result, Row, TableKind, Value};

use super::simplified;
use crate::filter::FilterFlags;
use crate::messages;
use crate::paged::PagedModel;
use crate::session::{SessionContext, SessionEvent};
use crate::table::{ColumnDef, TableQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsOwnerItem {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RsOwnersTable;

impl RsOwnersTable {
    pub const NAME: usize = 0;
}

static COLUMNS: [ColumnDef; 1] = [ColumnDef::new("Name")
    .filterable(FilterFlags::BASIC, &["name"])
    .sortable("name")];

impl TableQuery for RsOwnersTable {
    type Item = RsOwnerItem;

    fn kind(&self) -> TableKind {
        TableKind::RsOwners
    }

    fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
    }

    fn default_sort_column(&self) -> usize {
        Self::NAME
    }

    fn select_list(&self) -> &'static str {
        "id, name"
    }

    fn from_clause(&self) -> &'static str {
        "rs_owners"
    }

    fn id_expr(&self) -> &'static str {
        "id"
    }

    fn decode_row(&self, row: &Row) -> Result<RsOwnerItem> {
        Ok(RsOwnerItem {
            id: row.int(0)?,
            name: row.text(1)?,
        })
    }

    fn cell(&self, item: &RsOwnerItem, column: usize) -> Value {
        match column {
            Self::NAME => Value::from(item.name.as_str()),
            _ => Value::Null,
        }
    }
}

pub type RsOwnersModel = PagedModel<RsOwnersTable>;

impl PagedModel<RsOwnersTable> {
    pub fn new(ctx: &SessionContext) -> Self {
        Self::with_query(ctx, RsOwnersTable)
    }

    pub fn add_owner(&mut self, name: &str) -> Option<i64> {
        let name = simplified(name);
        if name.is_empty() {
            return None;
        }
        let id = self.insert_named("INSERT INTO rs_owners (name) VALUES (?)", &name, "owner")?;
        self.refresh_data(false);
        Some(id)
    }

    pub fn remove_owner(&mut self, id: i64) -> bool {
        let removed = self.delete_record(
            "rs_owners",
            id,
            "SELECT name FROM rs_owners WHERE id = ?",
            |name| messages::still_referenced("owner", name),
        );
        if removed {
            self.publish(SessionEvent::OwnerRemoved(id));
        }
        removed
    }

    pub fn set_owner_name(&mut self, row: usize, name: &str) -> bool {
        let Some(item) = self.cached_row(row) else {
            return false;
        };
        let id = item.id;
        let name = simplified(name);
        if name.is_empty() || item.name == name {
            return false;
        }

        if !self.update_name("rs_owners", id, &name, "owner") {
            return false;
        }
        self.commit_edit(row, RsOwnersTable::NAME, |item| item.name = name);
        true
    }
}
