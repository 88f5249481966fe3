use crate::commands::matching::find_matching_name;
use crate::model::OutputRow;

use super::block_scanner::{HorseBlock, ParsedPage};

pub(super) fn flatten_page(
    source: &str,
    page: &ParsedPage,
    known_horses: &[String],
) -> Vec<OutputRow> {
    page.blocks
        .iter()
        .flat_map(|block| flatten_block(source, page, block, known_horses))
        .collect()
}

/// One row per race entry; a block without entries still yields a single row.
fn flatten_block(
    source: &str,
    page: &ParsedPage,
    block: &HorseBlock,
    known_horses: &[String],
) -> Vec<OutputRow> {
    let horse_row = OutputRow {
        source: source.to_string(),
        page: page.number,
        page_title: page.title.clone(),
        horse_number: block.sequence,
        horse: block.name.clone(),
        age: block.age,
        auto_record: block.auto_record.map(|record| record.time),
        auto_record_date: block.auto_record.and_then(|record| record.date),
        standing_record: block.standing_record.map(|record| record.time),
        standing_record_date: block.standing_record.and_then(|record| record.date),
        run_date: None,
        run_time: None,
        run_position: None,
        matched_horse: find_matching_name(&block.name, known_horses).map(ToOwned::to_owned),
    };

    if block.entries.is_empty() {
        return vec![horse_row];
    }

    block
        .entries
        .iter()
        .map(|entry| OutputRow {
            run_date: entry.date,
            run_time: entry.time,
            run_position: entry.position,
            ..horse_row.clone()
        })
        .collect()
}
