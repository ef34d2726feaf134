/// Notifications published by a [`crate::PagedModel`].
///
/// Row indices are relative to the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// A refresh is about to replace the paging state
    ItemsAboutToChange,
    TotalCountChanged(u64),
    PageCountChanged(usize),
    CurrentPageChanged(usize),
    /// Rows `first..=last` have new content and must be re-read
    DataChanged { first: usize, last: usize },
    FilterChanged,
    /// Row count or identity changed; views must drop everything they hold
    ModelReset,
    /// Human-readable failure description
    ModelError(String),
}
