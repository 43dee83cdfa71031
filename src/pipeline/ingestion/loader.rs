use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::constants::is_na_token;
use crate::error::Result;
use crate::observability::metrics;

/// An untyped table exactly as a delimited file presents it.
///
/// Cells are `None` when the field was empty or an NA spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Apply `f` to every present cell, leaving missing cells alone
    pub fn map_cells<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        for row in &mut self.rows {
            for cell in row.iter_mut().flatten() {
                *cell = f(cell);
            }
        }
        self
    }
}

/// Counts from one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
}

/// Load a delimited file from disk. A missing or unreadable file is fatal;
/// malformed lines inside it are not.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_delimited(path: &Path, delimiter: u8, dataset: &str) -> Result<RawTable> {
    let file = File::open(path)?;
    let (table, report) = read_delimited(file, delimiter)?;

    info!(
        "📥 Loaded {} rows from {} ({} malformed lines skipped)",
        report.rows_loaded,
        path.display(),
        report.rows_skipped
    );
    metrics::load::rows_loaded(dataset, report.rows_loaded);
    metrics::load::rows_skipped(dataset, report.rows_skipped);

    Ok(table)
}

/// Parse delimited text with a header row.
///
/// Lines whose field count differs from the header, or that cannot be
/// decoded, are dropped and counted in the returned report.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<(RawTable, LoadReport)> {
    // `flexible(true)` so ragged lines reach us and can be skipped instead of aborting the read
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut report = LoadReport::default();
    let mut rows = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping undecodable line {}: {}", line + 2, e);
                report.rows_skipped += 1;
                continue;
            }
        };

        if record.len() != headers.len() {
            debug!(
                "Skipping line {}: expected {} fields, found {}",
                line + 2,
                headers.len(),
                record.len()
            );
            report.rows_skipped += 1;
            continue;
        }

        let row = record
            .iter()
            .map(|field| {
                if is_na_token(field) {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    report.rows_loaded = rows.len();
    Ok((RawTable { headers, rows }, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_lines_are_skipped() {
        let data = "phone,name,city\n1,Acme,Berlin\n2,Too,Many,Fields\n3,Short\n4,Delta,Paris\n";
        let (table, report) = read_delimited(data.as_bytes(), b',').unwrap();

        assert_eq!(table.headers, vec!["phone", "name", "city"]);
        assert_eq!(table.len(), 2);
        assert_eq!(report, LoadReport { rows_loaded: 2, rows_skipped: 2 });
        assert_eq!(table.rows[1][1].as_deref(), Some("Delta"));
    }

    #[test]
    fn test_semicolon_delimiter_and_quoting() {
        let data = "phone;legal_name\n\"555\";\"Smith; Sons\"\n";
        let (table, _) = read_delimited(data.as_bytes(), b';').unwrap();

        assert_eq!(table.rows[0][1].as_deref(), Some("Smith; Sons"));
    }

    #[test]
    fn test_empty_fields_and_na_tokens_load_as_missing() {
        let data = "phone,name,city,country\n1,,NA,n/a\n2,None,NULL,germany\n";
        let (table, _) = read_delimited(data.as_bytes(), b',').unwrap();

        assert_eq!(table.rows[0][1], None);
        assert_eq!(table.rows[0][2], None);
        assert_eq!(table.rows[0][3], None);
        assert_eq!(table.rows[1][1], None);
        assert_eq!(table.rows[1][2], None);
        assert_eq!(table.rows[1][3].as_deref(), Some("germany"));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut data = b"phone,name\n1,ok\n2,".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b"\n3,fine\n");

        let (table, report) = read_delimited(data.as_slice(), b',').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(report.rows_skipped, 1);
    }

    #[test]
    fn test_map_cells_skips_missing() {
        let table = RawTable {
            headers: vec!["a".into()],
            rows: vec![vec![Some("x".into())], vec![None]],
        };
        let mapped = table.map_cells(|s| s.to_uppercase());
        assert_eq!(mapped.rows[0][0].as_deref(), Some("X"));
        assert_eq!(mapped.rows[1][0], None);
    }
}
