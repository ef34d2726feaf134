//! MRTP Models - paged table models over the layout database
//!
//! Every manager table of the application (stations, segments, lines,
//! rolling stock) is a [`PagedModel`] parameterized by a [`TableQuery`]
//! describing its columns, filters, sort keys and row decoding. The model
//! keeps only a window of rows in memory, pages through the filtered and
//! sorted result set, and reports every change through typed
//! [`ModelEvent`]s instead of returning errors.
//!
//! # Example
//!
//! ```ignore
//! let ctx = SessionContext::new(connection, settings.paging);
//! let mut stations = StationsModel::new(&ctx);
//! stations.refresh_data(true);
//! stations.ensure_loaded(0..stations.current_item_count());
//! ```

mod event;
mod filter;
mod messages;
mod paged;
mod session;
mod table;
pub mod tables;

pub use event::ModelEvent;
pub use filter::{FilterFlags, is_null_filter};
pub use paged::{CellData, PagedModel};
pub use session::{SessionContext, SessionEvent};
pub use table::{ColumnDef, TableQuery};
pub use tables::{
    LinesModel, RollingstockModel, RsModelsModel, RsOwnersModel, SegmentsModel, StationsModel,
};
