//! Delimited-text parsing shared by every spreadsheet-backed data source.
//!
//! Spreadsheet exports are untrusted input: quoting may be malformed, rows
//! may be blank section breaks, and newlines appear inside quoted cells.
//! Parsing here is best-effort and never fails; structural damage degrades
//! to odd cell content rather than a lost dashboard.

/// A parsed table: verbatim header cells plus raw string rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTable {
    /// Header cells exactly as exported, used to build column lookups.
    pub header: Vec<String>,
    /// Data rows in input order. Rows may be shorter than the header.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Whether the table carries no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse CSV text into a header plus data rows.
///
/// The first non-blank record becomes the header; every later non-blank
/// record becomes a data row. Returns an empty table for empty input.
pub fn parse(text: &str) -> RawTable {
    let mut records = split_records(text);
    if records.is_empty() {
        return RawTable {
            header: Vec::new(),
            rows: Vec::new(),
        };
    }
    let header = records.remove(0);
    RawTable {
        header,
        rows: records,
    }
}

/// Split CSV text into records of raw string cells.
///
/// Handles double-quoted cells containing commas, embedded newlines, and
/// `""` escapes. Records end at `\n` or `\r\n` outside quotes. Records whose
/// cells are all empty after trimming are dropped. An unterminated quote
/// extends the final cell to the end of the input instead of failing.
pub fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(ch);
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => cells.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                flush_record(&mut cell, &mut cells, &mut records);
            }
            '\n' => flush_record(&mut cell, &mut cells, &mut records),
            _ => cell.push(ch),
        }
    }
    flush_record(&mut cell, &mut cells, &mut records);
    records
}

/// Close the current record, dropping it when every cell is blank.
fn flush_record(cell: &mut String, cells: &mut Vec<String>, records: &mut Vec<Vec<String>>) {
    cells.push(std::mem::take(cell));
    if cells.iter().all(|c| c.trim().is_empty()) {
        cells.clear();
    } else {
        records.push(std::mem::take(cells));
    }
}
