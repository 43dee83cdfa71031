use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::constants::{is_na_token, MAX_CELL_CHARS, PHONE_COLUMN};
use crate::domain::{Field, MergedListing, Phone};
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::normalize::NormalizedTable;

/// Write one normalized source table: a `phone` column followed by the
/// source's fields
#[instrument(skip_all, fields(source = %table.source, path = %path.display()))]
pub fn write_source_table(table: &NormalizedTable, path: &Path) -> Result<()> {
    let mut headers = vec![PHONE_COLUMN];
    headers.extend(table.fields.iter().map(|f| f.column()));

    let rows = table.rows.iter().map(|row| {
        let values = table
            .fields
            .iter()
            .map(|f| row.get(*f).unwrap_or_default())
            .collect::<Vec<_>>();
        (row.phone, values)
    });

    write_sheet(path, &headers, rows)?;
    info!("💾 Saved {} {} rows to {}", table.len(), table.source, path.display());
    Ok(())
}

/// Write the merged directory with columns phone, category, name, city, country, region
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_merged(rows: &[MergedListing], path: &Path) -> Result<()> {
    let mut headers = vec![PHONE_COLUMN];
    headers.extend(Field::ALL.iter().map(|f| f.column()));

    let rows = rows
        .iter()
        .map(|row| (row.phone, Field::ALL.iter().map(|f| row.get(*f)).collect::<Vec<_>>()));

    write_sheet(path, &headers, rows)?;
    info!("💾 Saved merged directory to {}", path.display());
    Ok(())
}

fn write_sheet<'a, I>(path: &Path, headers: &[&str], rows: I) -> Result<()>
where
    I: Iterator<Item = (Phone, Vec<&'a str>)>,
{
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (idx, (phone, values)) in rows.enumerate() {
        let row = (idx + 1) as u32;
        worksheet.write_number(row, 0, phone.value())?;
        for (col, value) in values.iter().enumerate() {
            write_text(worksheet, row, (col + 1) as u16, value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<()> {
    if value.chars().count() > MAX_CELL_CHARS {
        warn!(row, col, "Truncating cell longer than {} characters", MAX_CELL_CHARS);
        let truncated: String = value.chars().take(MAX_CELL_CHARS).collect();
        worksheet.write_string(row, col, truncated.as_str())?;
    } else {
        worksheet.write_string(row, col, value)?;
    }
    Ok(())
}

/// One cell of a reloaded workbook
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Grouping key: text as-is, numbers in their shortest form
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Number(n) => Some(match Phone::new(*n) {
                Some(p) => p.to_string(),
                None => n.to_string(),
            }),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

/// First worksheet of a workbook, header row split off
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, or an empty iterator when the column is absent
    pub fn column(&self, name: &str) -> impl Iterator<Item = &Cell> + '_ {
        let idx = self.column_index(name);
        self.rows.iter().filter_map(move |row| idx.and_then(|i| row.get(i)))
    }
}

/// Reload the first worksheet.
///
/// Empty cells, error cells and NA spellings (the `NULL` sentinel included)
/// come back as `Cell::Missing`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_sheet(path: &Path) -> Result<SheetTable> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PipelineError::EmptyWorkbook(path.display().to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Ok(SheetTable::default()),
    };

    let rows = rows
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(to_cell).collect();
            cells.resize(headers.len(), Cell::Missing);
            cells
        })
        .collect();

    Ok(SheetTable { headers, rows })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::String(s) if is_na_token(s) => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        other => Cell::Text(other.to_string()),
    }
}
