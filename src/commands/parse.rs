mod block_scanner;
mod dates;
mod page_extract;
mod rows;
mod run;
mod sink;
mod time_token;

pub use run::run;
