use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "lahdot",
    version,
    about = "Harness-racing program scraper: horse records and race history from start-list PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Parse(ParseArgs),
    Match(MatchArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Program PDF or pre-extracted text file (pages separated by form feeds).
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Destination for the rows; CSV and JSON go to stdout when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// File with one known horse name per line, matched against each block's name line.
    #[arg(long)]
    pub known_horses: Option<PathBuf>,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[arg(long, default_value = ".cache/lahdot")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long, default_value = "Yht:")]
    pub marker: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    Sqlite,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long = "candidate")]
    pub candidates: Vec<String>,

    #[arg(long)]
    pub candidates_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/lahdot")]
    pub cache_root: PathBuf,
}
