//! Session-wide state shared by every model

use mrtp_core::{Connection, EventBus};
use mrtp_settings::PagingSettings;
use std::sync::Arc;

/// Cross-model notifications, published after a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StationRemoved(i64),
    StationNameChanged(i64),
    SegmentRemoved(i64),
    LineRemoved(i64),
    OwnerRemoved(i64),
    ModelRemoved(i64),
    RollingstockRemoved(i64),
}

/// Database handle, session bus and paging settings of an open layout.
///
/// Cloning is cheap: clones share the connection and the bus.
#[derive(Clone)]
pub struct SessionContext {
    connection: Arc<dyn Connection>,
    events: Arc<EventBus<SessionEvent>>,
    settings: PagingSettings,
}

impl SessionContext {
    pub fn new(connection: Arc<dyn Connection>, settings: PagingSettings) -> Self {
        Self {
            connection,
            events: Arc::new(EventBus::new()),
            settings,
        }
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn events(&self) -> &Arc<EventBus<SessionEvent>> {
        &self.events
    }

    pub fn settings(&self) -> &PagingSettings {
        &self.settings
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("driver", &self.connection.driver_name())
            .field("events", &self.events)
            .field("settings", &self.settings)
            .finish()
    }
}
