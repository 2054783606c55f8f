//! Helper utilities.

mod time_parser;

pub use time_parser::{TimeParseError, parse_jvm_start};
