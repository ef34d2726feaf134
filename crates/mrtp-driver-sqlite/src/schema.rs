//! Layout schema: the tables browsed by the paged models

use indoc::indoc;
use mrtp_core::Result;

use crate::SqliteConnection;

pub const LAYOUT_SCHEMA: &str = indoc! {"
    CREATE TABLE IF NOT EXISTS stations (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        short_name TEXT UNIQUE,
        type INTEGER NOT NULL DEFAULT 0,
        phone_number INTEGER UNIQUE,
        svg_data BLOB,
        CHECK(length(name) > 0)
    );

    CREATE TABLE IF NOT EXISTS railway_segments (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        from_station_id INTEGER NOT NULL REFERENCES stations(id) ON DELETE RESTRICT,
        to_station_id INTEGER NOT NULL REFERENCES stations(id) ON DELETE RESTRICT,
        max_speed_kmh INTEGER NOT NULL,
        distance_meters INTEGER NOT NULL,
        electrified INTEGER NOT NULL DEFAULT 0,
        CHECK(from_station_id <> to_station_id),
        CHECK(max_speed_kmh > 0 AND distance_meters > 0)
    );

    CREATE TABLE IF NOT EXISTS lines (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        start_meters INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS line_segments (
        id INTEGER PRIMARY KEY,
        line_id INTEGER NOT NULL REFERENCES lines(id) ON DELETE CASCADE,
        seg_id INTEGER NOT NULL REFERENCES railway_segments(id) ON DELETE RESTRICT,
        pos INTEGER NOT NULL,
        UNIQUE(line_id, pos),
        UNIQUE(line_id, seg_id)
    );

    CREATE TABLE IF NOT EXISTS rs_owners (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS rs_models (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        suffix TEXT NOT NULL DEFAULT '',
        max_speed INTEGER NOT NULL DEFAULT 120,
        axes INTEGER NOT NULL DEFAULT 4,
        type INTEGER NOT NULL DEFAULT 0,
        sub_type INTEGER NOT NULL DEFAULT 0,
        UNIQUE(name, suffix)
    );

    CREATE TABLE IF NOT EXISTS rs_list (
        id INTEGER PRIMARY KEY,
        model_id INTEGER NOT NULL REFERENCES rs_models(id) ON DELETE RESTRICT,
        number INTEGER NOT NULL,
        owner_id INTEGER REFERENCES rs_owners(id) ON DELETE RESTRICT,
        UNIQUE(model_id, number)
    );

    CREATE INDEX IF NOT EXISTS idx_segments_from ON railway_segments(from_station_id);
    CREATE INDEX IF NOT EXISTS idx_segments_to ON railway_segments(to_station_id);
    CREATE INDEX IF NOT EXISTS idx_rs_list_owner ON rs_list(owner_id);
"};

/// Create every layout table that does not exist yet
#[tracing::instrument(skip(conn))]
pub fn create_layout_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(LAYOUT_SCHEMA)?;
    tracing::info!("layout schema ready");
    Ok(())
}
