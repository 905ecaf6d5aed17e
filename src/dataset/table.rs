//! In-memory CSV table with untyped cells.

use std::path::Path;

use super::error::DatasetError;
use super::record::Fields;
use super::value::RawValue;

/// Header plus rows of raw cells, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    /// Build a table, checking that every row matches the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawValue>>) -> Result<Self, DatasetError> {
        for (idx, name) in headers.iter().enumerate() {
            if headers[..idx].contains(name) {
                return Err(DatasetError::DuplicateColumn { name: name.clone() });
            }
        }
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(DatasetError::RaggedRow {
                    line: idx + 2,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    /// Read and parse a CSV file.
    pub fn load_csv(path: &Path) -> Result<Self, DatasetError> {
        if !path.is_file() {
            return Err(DatasetError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_csv(&text)
    }

    /// Parse CSV text: first record is the header, blank lines are skipped.
    pub fn parse_csv(text: &str) -> Result<Self, DatasetError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = split_records(text)?.into_iter();
        let (_, header) = records.next().ok_or(DatasetError::EmptyFile)?;
        let headers: Vec<String> = header.into_iter().map(|name| name.trim().to_string()).collect();
        let mut rows = Vec::new();
        for (line, fields) in records {
            if fields.len() != headers.len() {
                return Err(DatasetError::RaggedRow {
                    line,
                    expected: headers.len(),
                    found: fields.len(),
                });
            }
            rows.push(fields.iter().map(|cell| RawValue::parse_cell(cell)).collect());
        }
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> &RawValue {
        &self.rows[row][column]
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: RawValue) {
        self.rows[row][column] = value;
    }

    /// Iterate one column top to bottom.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &RawValue> + '_ {
        self.rows.iter().map(move |row| &row[column])
    }

    /// Remove a column by name, returning its cells.
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<RawValue>> {
        let idx = self.column_index(name)?;
        self.headers.remove(idx);
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Borrow a row as a name-addressable record.
    pub fn row(&self, row: usize) -> TableRow<'_> {
        TableRow { table: self, row }
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    table: &'a RawTable,
    row: usize,
}

impl Fields for TableRow<'_> {
    fn field(&self, column: &str) -> Option<&RawValue> {
        let idx = self.table.column_index(column)?;
        Some(self.table.cell(self.row, idx))
    }
}

fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, DatasetError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            _ => field.push(ch),
        }
    }
    if in_quotes {
        return Err(DatasetError::UnterminatedQuote { line: record_line });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    if fields.len() == 1 && fields[0].trim().is_empty() {
        return;
    }
    records.push((line, fields));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_typed_cells() {
        let table = RawTable::parse_csv("id,tenure,Contract\r\nA-1,12,Month-to-month\r\nB-2, ,Two year\r\n")
            .unwrap();
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.headers(), ["id", "tenure", "Contract"]);
        assert_eq!(*table.cell(0, 1), RawValue::Number(12.0));
        assert_eq!(*table.cell(1, 1), RawValue::Missing);
        assert_eq!(*table.cell(1, 2), RawValue::Text("Two year".into()));
    }

    #[test]
    fn handles_quotes_and_blank_lines() {
        let text = "name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n\n\"multi\nline\",x";
        let table = RawTable::parse_csv(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(*table.cell(0, 0), RawValue::Text("Smith, J".into()));
        assert_eq!(*table.cell(0, 1), RawValue::Text("said \"hi\"".into()));
        assert_eq!(*table.cell(1, 0), RawValue::Text("multi\nline".into()));
    }

    #[test]
    fn reports_ragged_rows_with_line_numbers() {
        let err = RawTable::parse_csv("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::RaggedRow {
                line: 3,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn rejects_unterminated_quotes_and_empty_input() {
        assert!(matches!(
            RawTable::parse_csv("a\n\"oops\n").unwrap_err(),
            DatasetError::UnterminatedQuote { line: 2 }
        ));
        assert!(matches!(
            RawTable::parse_csv("").unwrap_err(),
            DatasetError::EmptyFile
        ));
        assert!(matches!(
            RawTable::parse_csv("a,a\n1,2\n").unwrap_err(),
            DatasetError::DuplicateColumn { .. }
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = RawTable::load_csv(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    #[test]
    fn remove_column_and_row_view() {
        let mut table = RawTable::parse_csv("a,b,c\n1,x,3\n").unwrap();
        let removed = table.remove_column("b").unwrap();
        assert_eq!(removed, vec![RawValue::Text("x".into())]);
        assert_eq!(table.headers(), ["a", "c"]);
        assert_eq!(table.row(0).field("c"), Some(&RawValue::Number(3.0)));
        assert_eq!(table.row(0).field("b"), None);
        assert!(table.remove_column("b").is_none());
    }
}
