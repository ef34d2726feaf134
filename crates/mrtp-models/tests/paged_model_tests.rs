//! Integration tests for the generic paged model
//!
//! Exercises paging, windowed fetching, filtering and sorting through the
//! stations table over an in-memory layout.

mod common;

use mrtp_core::{TableKind, Value};
use mrtp_models::tables::StationsTable;
use mrtp_models::{CellData, FilterFlags, ModelEvent, SessionContext, StationsModel};
use mrtp_settings::PagingSettings;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{EventRecorder, FailingConnection, exec, page_values, seed_stations, session};

fn stations(items_per_page: usize, batch_size: usize, rows: usize) -> (SessionContext, StationsModel) {
    let ctx = session(TableKind::Stations, items_per_page, batch_size);
    seed_stations(&ctx, rows);
    let model = StationsModel::new(&ctx);
    (ctx, model)
}

fn direct_names(ctx: &SessionContext, order_by: &str, limit: usize, offset: usize) -> Vec<Value> {
    let sql = format!(
        "SELECT name FROM stations ORDER BY {}, id LIMIT ? OFFSET ?",
        order_by
    );
    ctx.connection()
        .query(&sql, &[Value::Int64(limit as i64), Value::Int64(offset as i64)])
        .unwrap()
        .rows
        .into_iter()
        .map(|r| r.values[0].clone())
        .collect()
}

// ============ Paging ============

#[test]
fn ten_rows_four_per_page() {
    let (_ctx, mut model) = stations(4, 100, 10);
    assert!(model.refresh_data(false));

    assert_eq!(model.total_items_count(), 10);
    assert_eq!(model.page_count(), 3);
    assert_eq!(model.current_item_count(), 4);

    assert!(model.switch_to_page(2));
    assert_eq!(model.current_item_count(), 2);

    assert!(!model.switch_to_page(5));
    assert!(!model.switch_to_page(2));
    assert_eq!(model.current_page(), 2);
    assert_eq!(model.row_header(0), 9);
}

#[test]
fn first_refresh_announces_new_paging() {
    let (_ctx, mut model) = stations(4, 100, 10);
    let recorder = EventRecorder::attach(&model);

    model.refresh_data(false);
    assert_eq!(
        recorder.take(),
        vec![
            ModelEvent::ItemsAboutToChange,
            ModelEvent::TotalCountChanged(10),
            ModelEvent::PageCountChanged(3),
            ModelEvent::ModelReset,
        ]
    );
}

#[test]
fn unchanged_refresh_is_silent() {
    let (_ctx, mut model) = stations(4, 100, 10);
    model.refresh_data(false);
    let recorder = EventRecorder::attach(&model);

    assert!(model.refresh_data(false));
    assert!(recorder.take().is_empty());

    // Forcing always resets
    model.refresh_data(true);
    assert!(recorder.take().contains(&ModelEvent::ModelReset));
}

#[test]
fn switching_page_reports_size_change_and_rows() {
    let (_ctx, mut model) = stations(4, 100, 10);
    model.refresh_data(false);
    let recorder = EventRecorder::attach(&model);

    model.switch_to_page(2);
    assert_eq!(
        recorder.take(),
        vec![
            ModelEvent::ModelReset,
            ModelEvent::CurrentPageChanged(2),
            ModelEvent::DataChanged { first: 0, last: 1 },
        ]
    );

    model.switch_to_page(1);
    assert_eq!(
        recorder.take(),
        vec![
            ModelEvent::ModelReset,
            ModelEvent::CurrentPageChanged(1),
            ModelEvent::DataChanged { first: 0, last: 3 },
        ]
    );
}

#[test]
fn shrinking_table_clamps_to_last_page() {
    let (ctx, mut model) = stations(4, 100, 10);
    model.refresh_data(false);
    model.switch_to_page(2);
    let recorder = EventRecorder::attach(&model);

    exec(&ctx, "DELETE FROM stations WHERE name >= 'S005'", &[]);
    model.refresh_data(false);

    assert_eq!(model.page_count(), 2);
    assert_eq!(model.current_page(), 1);
    assert_eq!(model.current_item_count(), 1);
    assert!(recorder.take().contains(&ModelEvent::CurrentPageChanged(1)));

    exec(&ctx, "DELETE FROM stations", &[]);
    model.refresh_data(false);
    assert_eq!(model.page_count(), 0);
    assert_eq!(model.current_page(), 0);
    assert_eq!(model.current_item_count(), 0);
    assert_eq!(model.data(0, 0), CellData::Invalid);
}

// ============ Fetching ============

#[test]
fn uncached_read_returns_placeholder_then_value() {
    let (_ctx, mut model) = stations(4, 100, 10);
    model.refresh_data(false);
    let recorder = EventRecorder::attach(&model);

    let first = model.data(0, StationsTable::NAME);
    assert!(first.is_loading());
    assert_eq!(first.to_string(), "...");
    assert_eq!(
        recorder.take(),
        vec![ModelEvent::DataChanged { first: 0, last: 3 }]
    );

    assert_eq!(
        model.data(0, StationsTable::NAME),
        CellData::Loaded(Value::from("S000"))
    );
    assert!(recorder.take().is_empty());
}

#[test]
fn out_of_range_reads_are_invalid() {
    let (_ctx, mut model) = stations(4, 100, 10);
    model.refresh_data(false);

    assert_eq!(model.data(4, 0), CellData::Invalid);
    assert_eq!(model.data(0, 9), CellData::Invalid);
    assert!(model.get_row(4).is_none());
    assert!(model.cached_data(0, 0).is_none());
}

#[test]
fn windowed_reads_match_full_scan() {
    let (ctx, mut model) = stations(7, 3, 20);
    model.refresh_data(false);

    for page in 0..model.page_count() {
        if page > 0 {
            assert!(model.switch_to_page(page));
        }
        let expected = direct_names(&ctx, "name", 7, page * 7);
        assert_eq!(page_values(&mut model, StationsTable::NAME), expected);
    }
}

#[test]
fn backward_scrolling_fetches_window_ending_at_row() {
    let (ctx, mut model) = stations(7, 3, 20);
    model.refresh_data(false);
    let expected = direct_names(&ctx, "name", 7, 0);

    for row in (0..model.current_item_count()).rev() {
        let value = match model.data(row, StationsTable::NAME) {
            CellData::Loading => model.data(row, StationsTable::NAME),
            other => other,
        };
        assert_eq!(value, CellData::Loaded(expected[row].clone()), "row {row}");
        assert!(model.cached_range().len() <= 3);
    }
}

#[test]
fn each_fetch_announces_the_window_it_cached() {
    let (_ctx, mut model) = stations(10, 3, 10);
    model.refresh_data(false);
    let recorder = EventRecorder::attach(&model);

    // Centred on an empty cache, then ending at / starting from the row
    let reads = [(5, 4..7), (2, 0..3), (7, 7..10)];
    for (row, window) in reads {
        assert!(model.data(row, StationsTable::NAME).is_loading());
        assert_eq!(model.cached_range(), window.clone());
        assert_eq!(
            recorder.take(),
            vec![ModelEvent::DataChanged {
                first: window.start,
                last: window.end - 1
            }]
        );
        assert!(model.ensure_loaded(window));
        assert!(recorder.take().is_empty());
    }
}

#[test]
fn ensure_loaded_cannot_exceed_batch() {
    let (_ctx, mut model) = stations(10, 4, 10);
    model.refresh_data(false);

    assert!(model.ensure_loaded(2..6));
    assert_eq!(model.cached_range(), 2..6);
    assert!(!model.ensure_loaded(0..10));
    // Ranges past the page end are clamped
    assert!(model.ensure_loaded(8..50));
}

#[test]
fn sorting_by_type_matches_full_scan() {
    let (ctx, mut model) = stations(50, 8, 20);
    model.refresh_data(false);
    assert!(model.set_sorting_column(StationsTable::TYPE));

    let expected = direct_names(&ctx, "type, name", 50, 0);
    assert_eq!(page_values(&mut model, StationsTable::NAME), expected);
}

// ============ Filtering ============

#[test]
fn name_filter_matches_name_or_short_name() {
    let (ctx, mut model) = stations(100, 100, 20);
    exec(
        &ctx,
        "UPDATE stations SET short_name = 'XS00' WHERE name = 'S015'",
        &[],
    );
    let recorder = EventRecorder::attach(&model);

    assert!(model.set_filter_at_col(StationsTable::NAME, "S00"));
    assert_eq!(recorder.take(), vec![ModelEvent::FilterChanged]);
    model.refresh_data(true);

    assert_eq!(model.total_items_count(), 11);
    assert_eq!(
        model.filter_at_col(StationsTable::NAME),
        ("S00", FilterFlags::BASIC)
    );
}

#[test]
fn null_filter_selects_missing_phone_numbers() {
    let (_ctx, mut model) = stations(100, 100, 20);

    assert!(model.set_filter_at_col(StationsTable::PHONE, "#null"));
    model.refresh_data(true);
    assert_eq!(model.total_items_count(), 10);
    assert!(
        page_values(&mut model, StationsTable::PHONE)
            .iter()
            .all(Value::is_null)
    );

    assert!(model.set_filter_at_col(StationsTable::PHONE, "100"));
    model.refresh_data(true);
    // 1000, 1002, ..., 1008
    assert_eq!(model.total_items_count(), 5);
}

#[test]
fn unsupported_filters_are_rejected_silently() {
    let (_ctx, mut model) = stations(100, 100, 5);
    let recorder = EventRecorder::attach(&model);

    assert!(!model.set_filter_at_col(StationsTable::SHORT_NAME, "x"));
    assert!(!model.set_filter_at_col(StationsTable::NAME, "#NULL"));
    assert!(!model.set_filter_at_col(42, "x"));
    assert!(recorder.take().is_empty());
    assert_eq!(model.filter_at_col(42), ("", FilterFlags::empty()));
}

#[test]
fn clearing_filters_emits_once() {
    let (_ctx, mut model) = stations(100, 100, 5);
    model.set_filter_at_col(StationsTable::NAME, "S");
    model.set_filter_at_col(StationsTable::PHONE, "1");
    let recorder = EventRecorder::attach(&model);

    model.clear_filters();
    model.clear_filters();
    assert_eq!(recorder.take(), vec![ModelEvent::FilterChanged]);
    assert_eq!(model.filter_at_col(StationsTable::NAME).0, "");
}

// ============ Sorting ============

#[test]
fn sort_change_drops_cache() {
    let (_ctx, mut model) = stations(10, 100, 10);
    model.refresh_data(false);
    assert!(model.ensure_loaded(0..10));
    let recorder = EventRecorder::attach(&model);

    assert!(!model.set_sorting_column(StationsTable::NAME));
    assert!(!model.set_sorting_column(StationsTable::PHONE));
    assert!(recorder.take().is_empty());
    assert!(model.cached_row(0).is_some());

    assert!(model.set_sorting_column(StationsTable::TYPE));
    assert_eq!(model.sorting_column(), StationsTable::TYPE);
    assert_eq!(
        recorder.take(),
        vec![ModelEvent::DataChanged { first: 0, last: 9 }]
    );
    assert!(model.data(0, StationsTable::NAME).is_loading());
}

// ============ Cache management ============

#[test]
fn invalidate_and_idle_eviction() {
    let (_ctx, mut model) = stations(10, 100, 10);
    model.refresh_data(false);
    model.ensure_loaded(0..10);

    model.invalidate_from(4);
    assert_eq!(model.cached_range(), 0..4);

    let now = Instant::now();
    assert!(!model.evict_if_idle(Duration::from_secs(60), now));
    assert!(model.evict_if_idle(Duration::from_secs(60), now + Duration::from_secs(120)));
    assert!(model.cached_row(0).is_none());
}

// ============ Failures ============

#[test]
fn failing_count_reports_error_and_keeps_state() {
    let conn = Arc::new(FailingConnection::new());
    let ctx = SessionContext::new(conn.clone(), PagingSettings::default());
    let mut model = StationsModel::new(&ctx);
    let recorder = EventRecorder::attach(&model);

    assert!(!model.refresh_data(false));
    assert_eq!(
        recorder.take(),
        vec![ModelEvent::ModelError("Error: disk I/O error".into())]
    );
    assert_eq!(model.total_items_count(), 0);
    assert!(conn.query_log.lock()[0].starts_with("SELECT COUNT(1) FROM stations"));
}

#[test]
fn headers_follow_column_definitions() {
    let (_ctx, model) = stations(10, 10, 0);
    assert_eq!(model.column_count(), 4);
    let headers: Vec<_> = (0..4).filter_map(|c| model.header(c)).collect();
    assert_eq!(headers, vec!["Name", "Short Name", "Type", "Phone"]);
    assert_eq!(model.items_per_page(), 10);
    assert_eq!(model.header(4), None);
}
