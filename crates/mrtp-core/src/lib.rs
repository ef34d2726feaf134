//! MRTP Core - shared abstractions for the layout table models
//!
//! This crate provides the types every other MRTP crate depends on:
//!
//! - `Connection` - synchronous trait for a relational connection
//! - `EventBus` - typed observer list used for all change notifications
//! - `TableKind` - identifies the layout tables that get a paged model
//! - Common types like `Value`, `Row`, `QueryResult`, and `MrtpError`

mod connection;
mod error;
mod events;
mod table_kind;
mod types;

pub use connection::*;
pub use error::*;
pub use events::*;
pub use table_kind::*;
pub use types::*;
