use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::ParseRunManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let latest_path = manifest_dir.join("parse_latest.json");

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !latest_path.exists() {
        warn!(path = %latest_path.display(), "no parse run manifest found");
        return Ok(());
    }

    let manifest: ParseRunManifest = read_json(&latest_path)?;
    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        marker = %manifest.marker,
        format = %manifest.format,
        output = %manifest.output_path.clone().unwrap_or_default(),
        pdftotext = %manifest.tool_versions.pdftotext.clone().unwrap_or_default(),
        "loaded latest parse run manifest"
    );
    info!(
        documents = manifest.counts.document_count,
        pages = manifest.counts.page_count,
        blocks = manifest.counts.block_count,
        race_entries = manifest.counts.race_entry_count,
        placeholder_rows = manifest.counts.placeholder_row_count,
        matched_rows = manifest.counts.matched_row_count,
        rows = manifest.counts.row_count,
        "parse run counts"
    );

    for source in &manifest.sources {
        info!(
            path = %source.path,
            kind = %source.kind,
            sha256 = %source.sha256,
            pages = source.page_count,
            empty_pages = source.empty_page_count,
            blocks = source.block_count,
            rows = source.row_count,
            "source document"
        );
    }

    for warning in &manifest.warnings {
        warn!(warning = %warning, "recorded parse warning");
    }

    if manifest.format == "sqlite" {
        let Some(db_path) = manifest.output_path.as_deref() else {
            return Ok(());
        };
        let conn = match Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
            Ok(conn) => conn,
            Err(err) => {
                warn!(path = %db_path, error = %err, "sqlite output unavailable");
                return Ok(());
            }
        };
        let total_rows = query_count(&conn, "SELECT COUNT(*) FROM race_rows").unwrap_or(0);
        let run_rows = conn
            .query_row(
                "SELECT COUNT(*) FROM race_rows WHERE run_id = ?1",
                [&manifest.run_id],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("failed to count rows for run {}", manifest.run_id))?;

        info!(path = %db_path, total_rows, run_rows, "sqlite output status");
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
