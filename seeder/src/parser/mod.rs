//! Seed file parsing.
//!
//! Turns UTF-8 CSV text into a [`Table`]: a header plus rows of string cells.
//! No type inference; every cell stays the text found in the file.

use serde::Serialize;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// Delimiters recognised on the header line, in tie-break order.
const DELIMITERS: [char; 3] = [',', ';', '\t'];

/// Parsed seed file content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// True when there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Decode raw bytes as UTF-8, dropping a leading byte order mark.
pub fn decode_content(bytes: &[u8]) -> CsvResult<String> {
    let (content, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(CsvError::Encoding);
    }
    Ok(content.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = DELIMITERS[0];
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with the detected delimiter.
///
/// Header names are trimmed, blank lines are skipped and quoted cells may
/// contain delimiters, quotes and line breaks. A row whose width differs from
/// the header is an error.
pub fn parse_table(content: &str) -> CsvResult<Table> {
    parse_table_with(content, detect_delimiter(content))
}

/// Parse CSV text with an explicit delimiter.
pub fn parse_table_with(content: &str, delimiter: char) -> CsvResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

/// Read, decode and parse a seed file.
pub async fn read_table(path: &Path) -> CsvResult<Table> {
    let bytes = tokio::fs::read(path).await?;
    let content = decode_content(&bytes)?;
    parse_table(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_table() {
        let table = parse_table("ID,NAME\n1,Acme\n2,Globex\n").unwrap();

        assert_eq!(table.headers, vec!["ID", "NAME"]);
        assert_eq!(table.rows, vec![vec!["1", "Acme"], vec!["2", "Globex"]]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let table = parse_table("ID;title;stock\n201;Wuthering Heights;12").unwrap();
        assert_eq!(table.headers, vec!["ID", "title", "stock"]);
        assert_eq!(table.rows[0], vec!["201", "Wuthering Heights", "12"]);
    }

    #[test]
    fn test_quoted_cells() {
        let csv = "ID,title\n1,\"Hello, \"\"World\"\"\"\n2,\"two\nlines\"\n";
        let table = parse_table(csv).unwrap();

        assert_eq!(table.rows[0][1], "Hello, \"World\"");
        assert_eq!(table.rows[1][1], "two\nlines");
    }

    #[test]
    fn test_cells_are_not_trimmed() {
        let table = parse_table(" ID , NAME \n1, O'Brien \n").unwrap();
        assert_eq!(table.headers, vec!["ID", "NAME"]);
        assert_eq!(table.rows[0][1], " O'Brien ");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = parse_table("a,b\n1,2\n\n3,4\n\n").unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_header_only() {
        let table = parse_table("ID,NAME\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn test_empty_content() {
        let table = parse_table("").unwrap();
        assert!(table.is_empty());
        assert!(table.headers.is_empty());
    }

    #[test]
    fn test_ragged_row_is_error() {
        let err = parse_table("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, CsvError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\n1\t2"), '\t');
        assert_eq!(detect_delimiter("ID\n1"), ',');
        assert_eq!(detect_delimiter("a,b;c\n"), ',');
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = b"\xEF\xBB\xBFID,NAME\n1,x\n";
        let content = decode_content(bytes).unwrap();
        assert!(content.starts_with("ID"));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert!(matches!(decode_content(bytes), Err(CsvError::Encoding)));
    }

    #[tokio::test]
    async fn test_read_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Books.csv");
        std::fs::write(&path, "ID,title\n201,Wuthering Heights\n").unwrap();

        let table = read_table(&path).await.unwrap();
        assert_eq!(table.rows, vec![vec!["201", "Wuthering Heights"]]);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let result = read_table(Path::new("/nonexistent/Books.csv")).await;
        assert!(matches!(result, Err(CsvError::Io(_))));
    }
}
