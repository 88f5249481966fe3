use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::model::OutputRow;
use crate::util::ensure_parent_directory;

pub(super) fn write_rows(
    format: OutputFormat,
    output_path: Option<&Path>,
    run_id: &str,
    rows: &[OutputRow],
) -> Result<()> {
    match (format, output_path) {
        (OutputFormat::Csv, Some(path)) => write_csv(create_output(path)?, rows)
            .with_context(|| format!("failed to write csv rows to {}", path.display())),
        (OutputFormat::Csv, None) => write_csv(io::stdout().lock(), rows),
        (OutputFormat::Json, Some(path)) => write_json(create_output(path)?, rows)
            .with_context(|| format!("failed to write json rows to {}", path.display())),
        (OutputFormat::Json, None) => write_json(io::stdout().lock(), rows),
        (OutputFormat::Sqlite, Some(path)) => write_sqlite(path, run_id, rows),
        (OutputFormat::Sqlite, None) => bail!("--output is required for sqlite format"),
    }
}

fn create_output(path: &Path) -> Result<File> {
    ensure_parent_directory(path)?;
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

pub(super) fn write_csv<W: Write>(writer: W, rows: &[OutputRow]) -> Result<()> {
    let mut output = csv::Writer::from_writer(writer);
    for row in rows {
        output
            .serialize(row)
            .context("failed to serialize csv row")?;
    }
    output.flush().context("failed to flush csv output")?;
    Ok(())
}

pub(super) fn write_json<W: Write>(writer: W, rows: &[OutputRow]) -> Result<()> {
    let mut output = io::BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut output, rows).context("failed to serialize json rows")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_sqlite(path: &Path, run_id: &str, rows: &[OutputRow]) -> Result<()> {
    ensure_parent_directory(path)?;
    let mut connection =
        Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    let inserted = insert_rows(&mut connection, run_id, rows)?;

    debug!(path = %path.display(), inserted, "inserted rows into sqlite sink");
    Ok(())
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS race_rows (
              row_id INTEGER PRIMARY KEY AUTOINCREMENT,
              run_id TEXT NOT NULL,
              source TEXT NOT NULL,
              page INTEGER NOT NULL,
              page_title TEXT NOT NULL,
              horse_number INTEGER NOT NULL,
              horse TEXT NOT NULL,
              age INTEGER,
              auto_record REAL,
              auto_record_date TEXT,
              standing_record REAL,
              standing_record_date TEXT,
              run_date TEXT,
              run_time REAL,
              run_position INTEGER,
              matched_horse TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_race_rows_run ON race_rows(run_id);
            CREATE INDEX IF NOT EXISTS idx_race_rows_horse ON race_rows(horse);
            ",
        )
        .context("failed to create race_rows schema")?;
    Ok(())
}

pub(super) fn insert_rows(
    connection: &mut Connection,
    run_id: &str,
    rows: &[OutputRow],
) -> Result<usize> {
    let tx = connection.transaction()?;
    let mut inserted = 0;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO race_rows (
              run_id, source, page, page_title, horse_number, horse, age,
              auto_record, auto_record_date, standing_record, standing_record_date,
              run_date, run_time, run_position, matched_horse
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ",
        )?;

        for row in rows {
            inserted += statement.execute(params![
                run_id,
                row.source,
                row.page as i64,
                row.page_title,
                row.horse_number as i64,
                row.horse,
                row.age,
                row.auto_record,
                row.auto_record_date,
                row.standing_record,
                row.standing_record_date,
                row.run_date,
                row.run_time,
                row.run_position,
                row.matched_horse,
            ])?;
        }
    }

    tx.commit().context("failed to commit race_rows transaction")?;
    Ok(inserted)
}
