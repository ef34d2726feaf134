//! SQLite driver for MRTP layout databases

mod connection;
mod schema;

pub use connection::SqliteConnection;
pub use schema::{LAYOUT_SCHEMA, create_layout_schema};
