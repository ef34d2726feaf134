//! Page-at-a-time table rendering

use anyhow::{Context, Result, bail};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use mrtp_core::TableKind;
use mrtp_models::{
    LinesModel, ModelEvent, PagedModel, RollingstockModel, RsModelsModel, RsOwnersModel,
    SegmentsModel, SessionContext, StationsModel, TableQuery,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// What to show from a table
#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    /// 0-based page
    pub page: usize,
    /// Column header to sort by
    pub sort: Option<String>,
    /// `(column header, filter text)` pairs
    pub filters: Vec<(String, String)>,
}

/// One rendered page
#[derive(Debug, Clone)]
pub struct PageView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub page: usize,
    pub page_count: usize,
    pub total: u64,
    /// Absolute 1-based number of the first row
    pub first_row_number: u64,
    /// `Header: hint` for columns that carry one
    pub notes: Vec<String>,
}

impl PageView {
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);

        let mut headers = vec![Cell::new("#").add_attribute(Attribute::Bold)];
        headers.extend(
            self.headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
        table.set_header(headers);

        for (offset, row) in self.rows.iter().enumerate() {
            let mut cells = vec![(self.first_row_number + offset as u64).to_string()];
            cells.extend(row.iter().cloned());
            table.add_row(cells);
        }

        let mut notes = String::new();
        for note in &self.notes {
            notes.push_str(note);
            notes.push('\n');
        }
        format!(
            "{table}\n{notes}Page {} of {} ({} rows)",
            self.page + 1,
            self.page_count.max(1),
            self.total
        )
    }
}

/// Load one page of `kind`
pub fn browse_table(ctx: &SessionContext, kind: TableKind, options: &BrowseOptions) -> Result<PageView> {
    match kind {
        TableKind::Stations => browse(StationsModel::new(ctx), options),
        TableKind::Segments => browse(SegmentsModel::new(ctx), options),
        TableKind::Lines => browse(LinesModel::new(ctx), options),
        TableKind::RsOwners => browse(RsOwnersModel::new(ctx), options),
        TableKind::RsModels => browse(RsModelsModel::new(ctx), options),
        TableKind::Rollingstock => browse(RollingstockModel::new(ctx), options),
    }
}

fn browse<Q: TableQuery>(mut model: PagedModel<Q>, options: &BrowseOptions) -> Result<PageView> {
    let errors = collect_errors(&model);

    for (column, text) in &options.filters {
        let col = column_index(&model, column)?;
        if !model.set_filter_at_col(col, text) {
            bail!("Column '{}' cannot be filtered by '{}'", column, text);
        }
    }
    if let Some(column) = &options.sort {
        let col = column_index(&model, column)?;
        if col != model.sorting_column() && !model.set_sorting_column(col) {
            bail!("Column '{}' is not sortable", column);
        }
    }

    if !model.refresh_data(true) {
        bail!(first_error(&errors, "count failed"));
    }
    if options.page >= model.page_count().max(1) {
        bail!(
            "Page {} does not exist, the table has {} page(s)",
            options.page + 1,
            model.page_count()
        );
    }
    if options.page > 0 {
        model.switch_to_page(options.page);
    }

    let mut rows = Vec::with_capacity(model.current_item_count());
    let mut row = 0;
    while row < model.current_item_count() {
        let end = (row + model.batch_size()).min(model.current_item_count());
        if !model.ensure_loaded(row..end) {
            bail!(first_error(&errors, "fetch failed"));
        }
        for r in row..end {
            let cells: Vec<String> = (0..model.column_count())
                .map(|c| {
                    model
                        .cached_data(r, c)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                })
                .collect();
            rows.push(cells);
        }
        row = end;
    }
    tracing::debug!(rows = rows.len(), page = model.current_page(), "page loaded");

    Ok(PageView {
        headers: (0..model.column_count())
            .filter_map(|c| model.header(c).map(str::to_string))
            .collect(),
        rows,
        page: model.current_page(),
        page_count: model.page_count(),
        total: model.total_items_count(),
        first_row_number: model.row_header(0),
        notes: model
            .columns()
            .iter()
            .filter_map(|def| def.tooltip.map(|hint| format!("{}: {}", def.header, hint)))
            .collect(),
    })
}

/// Column by header (case-insensitive) or 0-based index
fn column_index<Q: TableQuery>(model: &PagedModel<Q>, column: &str) -> Result<usize> {
    if let Ok(index) = column.parse::<usize>()
        && index < model.column_count()
    {
        return Ok(index);
    }
    (0..model.column_count())
        .find(|c| {
            model
                .header(*c)
                .is_some_and(|h| h.eq_ignore_ascii_case(column))
        })
        .with_context(|| format!("Unknown column '{}'", column))
}

/// Collects `ModelError` messages published by `model`; every event is
/// logged at debug level
pub fn collect_errors<Q: TableQuery>(model: &PagedModel<Q>) -> Arc<Mutex<Vec<String>>> {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    model.events().subscribe(move |event: &ModelEvent| {
        tracing::debug!(?event, "model event");
        if let ModelEvent::ModelError(message) = event {
            tracing::warn!(%message, "model error");
            sink.lock().push(message.clone());
        }
    });
    errors
}

pub fn first_error(errors: &Mutex<Vec<String>>, fallback: &str) -> String {
    errors
        .lock()
        .first()
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrtp_driver_sqlite::{SqliteConnection, create_layout_schema};
    use mrtp_settings::PagingSettings;
    use pretty_assertions::assert_eq;

    fn context_with_stations(count: usize, per_page: usize) -> SessionContext {
        let conn = SqliteConnection::open_in_memory().unwrap();
        create_layout_schema(&conn).unwrap();
        let mut settings = PagingSettings::default();
        settings.items_per_page.set(TableKind::Stations, per_page);
        settings.batch_size = 3;
        let ctx = SessionContext::new(conn.into_shared(), settings);

        let mut stations = StationsModel::new(&ctx);
        for i in 0..count {
            stations.add_station(&format!("Station {:02}", i)).unwrap();
        }
        ctx
    }

    #[test]
    fn loads_requested_page_across_batches() {
        let ctx = context_with_stations(12, 5);
        let view = browse_table(
            &ctx,
            TableKind::Stations,
            &BrowseOptions {
                page: 1,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(view.total, 12);
        assert_eq!(view.page_count, 3);
        assert_eq!(view.first_row_number, 6);
        let names: Vec<&str> = view.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(
            names,
            vec!["Station 05", "Station 06", "Station 07", "Station 08", "Station 09"]
        );
        assert!(view.render().ends_with("Page 2 of 3 (12 rows)"));
    }

    #[test]
    fn filters_and_sort_by_header_name() {
        let ctx = context_with_stations(12, 50);
        let view = browse_table(
            &ctx,
            TableKind::Stations,
            &BrowseOptions {
                sort: Some("type".into()),
                filters: vec![("name".into(), "1".into())],
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(view.total, 3);
        assert_eq!(view.headers, vec!["Name", "Short Name", "Type", "Phone"]);
        assert_eq!(
            view.notes,
            vec![
                "Name: Filter matches name and short name",
                "Phone: Use #NULL to list stations without a phone number"
            ]
        );
        let rendered = view.render();
        assert!(rendered.contains("\nPhone: Use #NULL to list stations without a phone number\nPage 1 of 1"));
    }

    #[test]
    fn rejects_unknown_columns_and_pages() {
        let ctx = context_with_stations(2, 50);
        let bad_column = BrowseOptions {
            sort: Some("elevation".into()),
            ..Default::default()
        };
        assert!(browse_table(&ctx, TableKind::Stations, &bad_column).is_err());

        let not_sortable = BrowseOptions {
            sort: Some("Phone".into()),
            ..Default::default()
        };
        let err = browse_table(&ctx, TableKind::Stations, &not_sortable).unwrap_err();
        assert_eq!(err.to_string(), "Column 'Phone' is not sortable");

        let past_end = BrowseOptions {
            page: 4,
            ..Default::default()
        };
        assert!(browse_table(&ctx, TableKind::Stations, &past_end).is_err());
    }

    #[test]
    fn empty_table_renders_single_page() {
        let ctx = context_with_stations(0, 50);
        let view = browse_table(&ctx, TableKind::Lines, &BrowseOptions::default()).unwrap();
        assert!(view.rows.is_empty());
        assert!(view.render().ends_with("Page 1 of 1 (0 rows)"));
    }
}
