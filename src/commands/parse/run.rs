use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cli::ParseArgs;
use crate::model::{OutputRow, ParseCounts, ParseRunManifest, SourceDocument, ToolVersions};
use crate::util::{
    ensure_directory, now_utc_string, read_name_list, sha256_file, utc_compact_string,
    write_json_pretty,
};

use super::block_scanner::RecordBlockParser;
use super::dates::DayMonthResolver;
use super::page_extract::{DocumentKind, extract_document, pdftotext_version};
use super::rows::flatten_page;
use super::sink::write_rows;

pub fn run(args: ParseArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("parse-{}", utc_compact_string(started_ts));

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("parse_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(run_id = %run_id, inputs = args.inputs.len(), marker = %args.marker, "starting parse");

    let known_horses = match &args.known_horses {
        Some(path) => {
            let names = read_name_list(path)?;
            info!(path = %path.display(), names = names.len(), "loaded known horse names");
            names
        }
        None => Vec::new(),
    };

    let parser = RecordBlockParser::new(&args.marker, DayMonthResolver::from_local_clock())?;
    let tool_versions = ToolVersions {
        pdftotext: args
            .inputs
            .iter()
            .any(|path| DocumentKind::from_path(path) == DocumentKind::Pdf)
            .then(pdftotext_version)
            .flatten(),
    };

    let mut rows: Vec<OutputRow> = Vec::new();
    let mut counts = ParseCounts::default();
    let mut sources = Vec::with_capacity(args.inputs.len());
    let mut warnings = Vec::new();

    for input in &args.inputs {
        let source = parse_document(
            &parser,
            input,
            args.max_pages,
            &known_horses,
            &mut rows,
            &mut counts,
            &mut warnings,
        )?;
        sources.push(source);
    }
    counts.document_count = sources.len();
    counts.row_count = rows.len();

    if rows.is_empty() {
        let message = format!("no '{}' blocks found in any input", args.marker);
        warn!("{message}");
        warnings.push(message);
    }

    write_rows(args.format, args.output.as_deref(), &run_id, &rows)?;
    if let Some(output) = &args.output {
        info!(path = %output.display(), format = args.format.as_str(), rows = rows.len(), "wrote rows");
    }

    let manifest = ParseRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_parse_command(&args),
        marker: args.marker.clone(),
        format: args.format.as_str().to_string(),
        output_path: args
            .output
            .as_ref()
            .map(|path| path.display().to_string()),
        tool_versions,
        counts,
        sources,
        warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    write_json_pretty(&manifest_dir.join("parse_latest.json"), &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote parse run manifest");
    info!(
        documents = manifest.counts.document_count,
        blocks = manifest.counts.block_count,
        rows = manifest.counts.row_count,
        "parse completed"
    );

    Ok(())
}

fn parse_document(
    parser: &RecordBlockParser,
    path: &Path,
    max_pages: Option<usize>,
    known_horses: &[String],
    rows: &mut Vec<OutputRow>,
    counts: &mut ParseCounts,
    warnings: &mut Vec<String>,
) -> Result<SourceDocument> {
    let document = extract_document(path, max_pages)?;
    let sha256 = sha256_file(path)?;
    let source_name = path.display().to_string();

    info!(
        path = %source_name,
        kind = document.kind.as_str(),
        pages = document.pages.len(),
        "extracted program document"
    );

    let empty_page_count = document.empty_page_count();
    if empty_page_count > 0 {
        let message = format!(
            "{source_name}: {empty_page_count} of {} pages have no text layer",
            document.pages.len()
        );
        warn!("{message}");
        warnings.push(message);
    }

    let rows_before = rows.len();
    let mut block_count = 0;

    for (index, page_text) in document.pages.iter().enumerate() {
        let page = parser.parse_page(index + 1, page_text);
        debug!(
            path = %source_name,
            page = page.number,
            title = %page.title,
            blocks = page.blocks.len(),
            "parsed page"
        );

        block_count += page.blocks.len();
        for block in &page.blocks {
            counts.race_entry_count += block.entries.len();
            if block.entries.is_empty() {
                counts.placeholder_row_count += 1;
            }
        }

        let page_rows = flatten_page(&source_name, &page, known_horses);
        counts.matched_row_count += page_rows
            .iter()
            .filter(|row| row.matched_horse.is_some())
            .count();
        rows.extend(page_rows);
    }

    counts.page_count += document.pages.len();
    counts.block_count += block_count;

    Ok(SourceDocument {
        path: source_name,
        kind: document.kind.as_str().to_string(),
        sha256,
        page_count: document.pages.len(),
        empty_page_count,
        block_count,
        row_count: rows.len() - rows_before,
    })
}

fn render_parse_command(args: &ParseArgs) -> String {
    let mut command = vec!["lahdot".to_string(), "parse".to_string()];
    for input in &args.inputs {
        command.push("--input".to_string());
        command.push(input.display().to_string());
    }
    command.push("--format".to_string());
    command.push(args.format.as_str().to_string());
    if let Some(output) = &args.output {
        command.push("--output".to_string());
        command.push(output.display().to_string());
    }
    if let Some(known_horses) = &args.known_horses {
        command.push("--known-horses".to_string());
        command.push(known_horses.display().to_string());
    }
    if let Some(max_pages) = args.max_pages {
        command.push("--max-pages".to_string());
        command.push(max_pages.to_string());
    }
    command.push("--cache-root".to_string());
    command.push(args.cache_root.display().to_string());
    command.push("--marker".to_string());
    command.push(args.marker.clone());
    command.join(" ")
}
