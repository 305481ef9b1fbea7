//! Reading raw tables from delimited text files.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig, detect_delimiter};
pub use source::SourceMetadata;
