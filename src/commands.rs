pub mod matching;
pub mod parse;
pub mod status;
