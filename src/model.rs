use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One flattened output record: horse-level fields joined with at most one race entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub source: String,
    pub page: usize,
    pub page_title: String,
    pub horse_number: usize,
    pub horse: String,
    pub age: Option<u32>,
    pub auto_record: Option<f64>,
    pub auto_record_date: Option<NaiveDate>,
    pub standing_record: Option<f64>,
    pub standing_record_date: Option<NaiveDate>,
    pub run_date: Option<NaiveDate>,
    pub run_time: Option<f64>,
    pub run_position: Option<u32>,
    pub matched_horse: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    pub page_count: usize,
    pub empty_page_count: usize,
    pub block_count: usize,
    pub row_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseCounts {
    pub document_count: usize,
    pub page_count: usize,
    pub block_count: usize,
    pub race_entry_count: usize,
    pub placeholder_row_count: usize,
    pub row_count: usize,
    pub matched_row_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub marker: String,
    pub format: String,
    pub output_path: Option<String>,
    pub tool_versions: ToolVersions,
    pub counts: ParseCounts,
    pub sources: Vec<SourceDocument>,
    pub warnings: Vec<String>,
}
