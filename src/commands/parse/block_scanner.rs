use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use regex::{Match, Regex};

use super::dates::DayMonthResolver;
use super::time_token::{TimeToken, comma_decimal};

/// Lines scanned for race entries, counted from the name line.
pub(super) const RUN_WINDOW_LINES: usize = 20;
/// Personal-best date lookup stops this many lines after the age line.
pub(super) const RECORD_DATE_SEARCH_LINES: usize = 15;
/// The lookup skips the lines directly under the age line.
const RECORD_DATE_SEARCH_SKIP: usize = 2;
/// Characters after a clean race time inspected for a finishing position.
const TRAILING_POSITION_WINDOW: usize = 5;
const AGE_SUFFIX: &str = "v ";

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PersonalBest {
    pub time: f64,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct RaceEntry {
    pub date: Option<NaiveDate>,
    pub time: Option<f64>,
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct HorseBlock {
    pub marker_index: usize,
    /// Running number of the block on its page, starting at 1.
    pub sequence: usize,
    pub name: String,
    pub age: Option<u32>,
    pub auto_record: Option<PersonalBest>,
    pub standing_record: Option<PersonalBest>,
    pub entries: Vec<RaceEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ParsedPage {
    pub number: usize,
    pub title: String,
    pub blocks: Vec<HorseBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    AwaitingMarker,
    ReadingName,
    ReadingAge,
    ScanningRuns { scanned: usize },
    Done,
}

#[derive(Debug)]
pub(super) struct RecordBlockParser {
    marker: String,
    standing_record: Regex,
    auto_record: Regex,
    day_month: Regex,
    race_line: Regex,
    race_time: Regex,
    digit_run: Regex,
    dates: DayMonthResolver,
}

impl RecordBlockParser {
    pub(super) fn new(marker: &str, dates: DayMonthResolver) -> Result<Self> {
        if marker.is_empty() {
            bail!("block marker must not be empty");
        }

        Ok(Self {
            marker: marker.to_string(),
            standing_record: Regex::new(r"(\d{1,2},\d)[A-Za-z]{2}\b")
                .context("failed to compile standing-start record regex")?,
            auto_record: Regex::new(r"(\d{1,2},\d)[A-Za-z]{3}")
                .context("failed to compile auto-start record regex")?,
            day_month: Regex::new(r"\d{2}\.\d{2}").context("failed to compile day.month regex")?,
            race_line: Regex::new(r"[A-ZÄÖÅ][a-zäöå]?(\d{2}\.\d{2})")
                .context("failed to compile race line regex")?,
            race_time: Regex::new(r"\d{1,2},\d+(?:[^\d\s,]{1,2}\d+(?:[^\d,]|$))?")
                .context("failed to compile race time regex")?,
            digit_run: Regex::new(r"[0-9]+").context("failed to compile digit run regex")?,
            dates,
        })
    }

    pub(super) fn parse_page(&self, number: usize, text: &str) -> ParsedPage {
        let lines: Vec<&str> = text.split('\n').collect();
        let title = lines.get(1).copied().unwrap_or_default().to_string();

        ParsedPage {
            number,
            title,
            blocks: self.scan_blocks(&lines).collect(),
        }
    }

    pub(super) fn scan_blocks<'a>(&'a self, lines: &'a [&'a str]) -> BlockScanner<'a> {
        BlockScanner {
            parser: self,
            lines,
            cursor: 0,
            sequence: 0,
        }
    }

    fn is_marker(&self, line: &str) -> bool {
        line.contains(&self.marker)
    }

    fn parse_age(&self, age_line: &str, sequence: usize) -> Option<u32> {
        // the age column is prefixed with the horse's running number
        let prefix_chars = sequence.to_string().len();
        let rest = match age_line.char_indices().nth(prefix_chars) {
            Some((offset, _)) => &age_line[offset..],
            None => "",
        };
        let text = rest.find(AGE_SUFFIX).map_or(rest, |end| &rest[..end]);
        if text.trim().is_empty() {
            return None;
        }

        self.digit_run.find(text)?.as_str().parse::<u32>().ok()
    }

    fn personal_best(
        &self,
        pattern: &Regex,
        name_line: &str,
        lines: &[&str],
        age_index: usize,
    ) -> Option<PersonalBest> {
        let token = pattern.captures(name_line)?.get(1)?.as_str();
        let time = comma_decimal(token)?;

        Some(PersonalBest {
            time,
            date: self.record_date(lines, age_index, token),
        })
    }

    fn record_date(&self, lines: &[&str], age_index: usize, token: &str) -> Option<NaiveDate> {
        let start = age_index + RECORD_DATE_SEARCH_SKIP;
        let end = (age_index + RECORD_DATE_SEARCH_LINES).min(lines.len());
        let line = lines
            .get(start..end)?
            .iter()
            .find(|line| line.contains(token))?;

        let day_month = self.day_month.find(line)?;
        self.dates.resolve(day_month.as_str())
    }

    pub(super) fn parse_race_line(&self, line: &str) -> Option<RaceEntry> {
        let captures = self.race_line.captures(line)?;
        let date = captures
            .get(1)
            .and_then(|day_month| self.dates.resolve(day_month.as_str()));

        let Some(token) = self.race_time.find_iter(line).last() else {
            return Some(RaceEntry {
                date,
                time: None,
                position: None,
            });
        };

        // a glued position must not be the minutes of a following time, so the
        // glue branch also consumes one terminator character
        let token_text = token
            .as_str()
            .trim_end_matches(|character: char| !character.is_numeric());
        let (time, position) = match TimeToken::parse(token_text) {
            TimeToken::Time(time) => (Some(time), self.trailing_position(line, &token)),
            TimeToken::TimeWithPosition { time, position } => (Some(time), position),
            TimeToken::Unparsed => (None, None),
        };

        Some(RaceEntry {
            date,
            time,
            position,
        })
    }

    /// First digit run in the few characters after `token` that does not hang
    /// off a letter (`a3` style annotations are not positions).
    fn trailing_position(&self, line: &str, token: &Match<'_>) -> Option<u32> {
        let window: String = line[token.end()..]
            .chars()
            .take(TRAILING_POSITION_WINDOW)
            .collect();

        self.digit_run
            .find_iter(&window)
            .find(|run| {
                !window[..run.start()]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_alphabetic)
            })
            .and_then(|run| run.as_str().parse::<u32>().ok())
    }
}

/// Walks one page's lines and yields a [`HorseBlock`] per marker line.
///
/// Blocks may overlap: scanning for the next marker resumes right after the
/// previous marker, not after the previous block's run window.
pub(super) struct BlockScanner<'a> {
    parser: &'a RecordBlockParser,
    lines: &'a [&'a str],
    cursor: usize,
    sequence: usize,
}

impl BlockScanner<'_> {
    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).copied()
    }

    fn run_line(&self, block: &HorseBlock, scanned: usize) -> Option<&str> {
        if scanned >= RUN_WINDOW_LINES {
            return None;
        }
        self.line(block.marker_index + 1 + scanned)
            .filter(|line| !self.parser.is_marker(line))
    }
}

impl Iterator for BlockScanner<'_> {
    type Item = HorseBlock;

    fn next(&mut self) -> Option<Self::Item> {
        let mut state = ScanState::AwaitingMarker;
        let mut block = HorseBlock::default();

        loop {
            state = match state {
                ScanState::AwaitingMarker => {
                    let offset = self
                        .lines
                        .get(self.cursor..)?
                        .iter()
                        .position(|line| self.parser.is_marker(line))?;
                    let marker_index = self.cursor + offset;
                    self.cursor = marker_index + 1;
                    self.sequence += 1;
                    block = HorseBlock {
                        marker_index,
                        sequence: self.sequence,
                        ..HorseBlock::default()
                    };
                    ScanState::ReadingName
                }
                ScanState::ReadingName => {
                    let age_index = block.marker_index + 2;
                    block.name = self
                        .line(block.marker_index + 1)
                        .unwrap_or_default()
                        .to_string();
                    block.standing_record = self.parser.personal_best(
                        &self.parser.standing_record,
                        &block.name,
                        self.lines,
                        age_index,
                    );
                    block.auto_record = self.parser.personal_best(
                        &self.parser.auto_record,
                        &block.name,
                        self.lines,
                        age_index,
                    );
                    ScanState::ReadingAge
                }
                ScanState::ReadingAge => {
                    block.age = self
                        .line(block.marker_index + 2)
                        .and_then(|line| self.parser.parse_age(line, block.sequence));
                    ScanState::ScanningRuns { scanned: 0 }
                }
                ScanState::ScanningRuns { scanned } => match self.run_line(&block, scanned) {
                    Some(line) => {
                        if let Some(entry) = self.parser.parse_race_line(line) {
                            block.entries.push(entry);
                        }
                        ScanState::ScanningRuns {
                            scanned: scanned + 1,
                        }
                    }
                    None => ScanState::Done,
                },
                ScanState::Done => return Some(block),
            };
        }
    }
}
