//! CSV/TSV reader with delimiter detection.
//!
//! This is the file-reading collaborator: it turns spreadsheet exports into
//! raw [`DataTable`]s. The pipeline itself never touches the filesystem for
//! input.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{MedallionError, Result};
use crate::table::{DataTable, Value};

use super::source::SourceMetadata;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited text files into raw tables.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the raw table and its metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        let io_err = |e| MedallionError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let size_bytes = file.metadata().map_err(io_err)?.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(io_err)?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse in-memory bytes with a known delimiter.
    ///
    /// Every cell becomes [`Value::Text`] or [`Value::Null`]; typing happens
    /// later, in the normalizer.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        // Strip a UTF-8 BOM, common in spreadsheet exports.
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(MedallionError::MalformedInput(
                "No columns found".to_string(),
            ));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            let mut row: Vec<Value> = record.iter().map(Value::text).collect();
            row.resize(expected_cols, Value::Null);
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(MedallionError::MalformedInput(
                "No data rows found".to_string(),
            ));
        }

        Ok(DataTable::from_rows(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the delimiter by analyzing the first few lines.
pub fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(MedallionError::MalformedInput(
            "No lines to analyze".to_string(),
        ));
    }

    let best = DELIMITERS
        .iter()
        .map(|&delim| {
            let counts: Vec<usize> = lines
                .iter()
                .map(|line| count_delimiter_in_line(line, delim))
                .collect();
            (delim, delimiter_score(&counts, delim))
        })
        .filter(|&(_, score)| score > 0)
        // Earlier delimiters win ties.
        .fold(None, |best: Option<(u8, usize)>, candidate| match best {
            Some(b) if b.1 >= candidate.1 => Some(b),
            _ => Some(candidate),
        });

    Ok(best.map_or(b',', |(delim, _)| delim))
}

/// Rank a delimiter by how evenly it splits the sampled lines.
///
/// An identical count on every line ranks highest, tab slightly ahead of the
/// rest; near-identical counts rank next. Zero when the header lacks it.
fn delimiter_score(counts: &[usize], delim: u8) -> usize {
    let header = counts.first().copied().unwrap_or(0);
    if header == 0 {
        return 0;
    }

    if counts.iter().all(|&c| c == header) {
        let tab_bonus = if delim == b'\t' { 100 } else { 0 };
        return header * 1000 + tab_bonus;
    }

    let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    let variance = counts
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / counts.len() as f64;
    if variance < 1.0 { header * 100 } else { header }
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_delimiter_prefers_consistent_split() {
        // Commas inside quotes do not count.
        let data = b"a;b;c\n\"1,5\";2;3\n\"4,5\";5;6";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
        assert_eq!(delimiter_score(&[2, 2, 2], b'\t'), 2100);
        assert_eq!(delimiter_score(&[0, 3], b','), 0);
    }

    #[test]
    fn test_parse_chinese_headers() {
        let parser = Parser::new();
        let data = "市场,产品,销售额\nRX,A,100\n电子商务,B,NA\n".as_bytes();
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.column_names(), vec!["市场", "产品", "销售额"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 2), Some(&Value::text("100")));
        assert_eq!(table.get(1, 2), Some(&Value::Null));
    }

    #[test]
    fn test_parse_strips_bom_and_pads_rows() {
        let parser = Parser::new();
        let data = b"\xEF\xBB\xBFa,b,c\n1,2\n";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.columns[0].name, "a");
        assert_eq!(table.get(0, 2), Some(&Value::Null));
    }

    #[test]
    fn test_parse_header_only_is_malformed() {
        let parser = Parser::new();
        let err = parser.parse_bytes(b"a,b\n", b',').unwrap_err();
        assert!(matches!(err, MedallionError::MalformedInput(_)));
    }
}
