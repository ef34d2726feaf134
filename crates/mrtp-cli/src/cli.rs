//! `mrtp`: create and browse railway layout databases from the terminal

mod browse;
mod logging;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use mrtp_core::TableKind;
use mrtp_driver_sqlite::{SqliteConnection, create_layout_schema};
use mrtp_models::{LinesModel, PagedModel, RsOwnersModel, SessionContext, StationsModel, TableQuery};
use mrtp_settings::MrtpSettings;
use std::path::{Path, PathBuf};

use browse::{BrowseOptions, browse_table, collect_errors, first_error};
use logging::LoggingConfig;

#[derive(Debug, Parser)]
#[command(name = "mrtp", version, about = "Model railway timetable planner layout tool")]
struct Cli {
    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to the log directory
    #[arg(long, global = true)]
    log_json: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, env = "MRTP_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a layout database (or add missing tables to an existing one)
    Init { db: PathBuf },

    /// Add a record by name
    Add {
        db: PathBuf,
        #[arg(value_enum)]
        kind: AddKind,
        name: String,
    },

    /// Print one page of a table
    Browse {
        db: PathBuf,
        /// stations, segments, lines, owners, models or rollingstock
        table: TableKind,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Column header to sort by
        #[arg(long)]
        sort: Option<String>,
        /// COLUMN=TEXT, repeatable; `#NULL` selects empty values where supported
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Override the configured page size for this table
        #[arg(long)]
        items_per_page: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AddKind {
    Station,
    Owner,
    Line,
}

fn parse_filter(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((column, text)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), text.to_string()))
        }
        _ => Err(format!("expected COLUMN=TEXT, got '{}'", arg)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    let _log_guard = logging::init(&config.with_json_logs(cli.log_json))?;

    let mut settings = load_settings(cli.settings.as_deref());

    match cli.command {
        Command::Init { db } => {
            open_layout(&db)?;
            println!("Initialized layout database {}", db.display());
            remember(&mut settings, cli.settings.as_deref(), &db);
        }
        Command::Add { db, kind, name } => {
            let ctx = SessionContext::new(open_layout(&db)?, settings.paging.clone());
            let id = match kind {
                AddKind::Station => add(StationsModel::new(&ctx), |m| m.add_station(&name))?,
                AddKind::Owner => add(RsOwnersModel::new(&ctx), |m| m.add_owner(&name))?,
                AddKind::Line => add(LinesModel::new(&ctx), |m| m.add_line(&name))?,
            };
            println!("Added {:?} '{}' with id {}", kind, name.trim(), id);
            remember(&mut settings, cli.settings.as_deref(), &db);
        }
        Command::Browse {
            db,
            table,
            page,
            sort,
            filters,
            items_per_page,
        } => {
            if page == 0 {
                bail!("Pages are numbered from 1");
            }
            if !db.exists() {
                bail!("Database {} does not exist", db.display());
            }
            let mut paging = settings.paging.clone();
            if let Some(n) = items_per_page {
                paging.items_per_page.set(table, n);
            }
            let ctx = SessionContext::new(open_layout(&db)?, paging);
            let options = BrowseOptions {
                page: page - 1,
                sort,
                filters,
            };
            let view = browse_table(&ctx, table, &options)?;
            println!("{}", view.render());
        }
    }
    Ok(())
}

/// Open `db` and make sure every layout table exists
fn open_layout(db: &Path) -> Result<std::sync::Arc<dyn mrtp_core::Connection>> {
    let path = db
        .to_str()
        .with_context(|| format!("Path is not valid UTF-8: {}", db.display()))?;
    let conn = SqliteConnection::open(path)
        .with_context(|| format!("Cannot open {}", db.display()))?;
    create_layout_schema(&conn).context("Cannot create layout tables")?;
    Ok(conn.into_shared())
}

fn add<Q: TableQuery>(
    mut model: PagedModel<Q>,
    insert: impl FnOnce(&mut PagedModel<Q>) -> Option<i64>,
) -> Result<i64> {
    let errors = collect_errors(&model);
    match insert(&mut model) {
        Some(id) => Ok(id),
        None => bail!(first_error(&errors, "name must not be empty")),
    }
}

fn load_settings(path: Option<&Path>) -> MrtpSettings {
    let loaded = match path {
        Some(path) => MrtpSettings::load_from(path),
        None => MrtpSettings::load(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default settings");
        MrtpSettings::default()
    })
}

/// Record `db` in the recent files list; failures only warn
fn remember(settings: &mut MrtpSettings, path: Option<&Path>, db: &Path) {
    let db = db.canonicalize().unwrap_or_else(|_| db.to_path_buf());
    settings.general.push_recent_file(db);
    let saved = match path {
        Some(path) => settings.save_to(path),
        None => settings.save(),
    };
    if let Err(e) = saved {
        tracing::warn!(error = %e, "could not save settings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_browse_arguments() {
        let cli = Cli::try_parse_from([
            "mrtp",
            "browse",
            "layout.db",
            "rs",
            "--page",
            "2",
            "--sort",
            "Owner",
            "--filter",
            "owner=#NULL",
            "--filter",
            "model=E6",
        ])
        .unwrap();

        match cli.command {
            Command::Browse {
                table,
                page,
                sort,
                filters,
                ..
            } => {
                assert_eq!(table, TableKind::Rollingstock);
                assert_eq!(page, 2);
                assert_eq!(sort.as_deref(), Some("Owner"));
                assert_eq!(
                    filters,
                    vec![
                        ("owner".to_string(), "#NULL".to_string()),
                        ("model".to_string(), "E6".to_string())
                    ]
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_filter() {
        assert!(parse_filter("name").is_err());
        assert!(parse_filter("=x").is_err());
        assert_eq!(
            parse_filter("Name=a=b").unwrap(),
            ("Name".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn init_then_add_reports_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("layout.db");
        let conn = open_layout(&db).unwrap();
        let ctx = SessionContext::new(conn, Default::default());

        let id = add(StationsModel::new(&ctx), |m| m.add_station("Roma")).unwrap();
        assert!(id > 0);
        let err = add(StationsModel::new(&ctx), |m| m.add_station("Roma")).unwrap_err();
        assert!(err.to_string().contains("already used by another station"));
        let err = add(RsOwnersModel::new(&ctx), |m| m.add_owner("  ")).unwrap_err();
        assert_eq!(err.to_string(), "name must not be empty");
    }

    #[test]
    fn settings_remember_recent_databases() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("settings.json");
        let db = dir.path().join("layout.db");
        open_layout(&db).unwrap();

        let mut settings = load_settings(Some(&settings_path));
        remember(&mut settings, Some(&settings_path), &db);

        let reloaded = load_settings(Some(&settings_path));
        assert_eq!(reloaded.general.recent_files.len(), 1);
        assert!(reloaded.general.recent_files[0].ends_with("layout.db"));
    }
}
