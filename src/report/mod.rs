//! Descriptive analysis of the merged directory
//!
//! [`summarize`] is a pure function from a reloaded sheet to a [`Report`];
//! printing and JSON output live in [`render`].

pub mod render;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, instrument};

use crate::constants::{PHONE_COLUMN, TOP_CATEGORIES, TOP_COUNTRIES};
use crate::domain::Field;
use crate::error::Result;
use crate::pipeline::storage::{read_sheet, Cell, SheetTable};

pub use render::{print_report, write_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// Schema line for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub non_missing: usize,
}

/// Descriptive statistics for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    Numeric {
        column: String,
        count: usize,
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        q25: Option<f64>,
        median: Option<f64>,
        q75: Option<f64>,
        max: Option<f64>,
    },
    Text {
        column: String,
        count: usize,
        unique: usize,
        top: Option<String>,
        freq: usize,
    },
}

/// A value and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frequency {
    pub value: String,
    pub count: usize,
}

/// Zero-filled country × category counts, both axes sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub countries: Vec<String>,
    pub categories: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn row(&self, country: &str) -> Option<&[usize]> {
        self.countries
            .iter()
            .position(|c| c == country)
            .map(|idx| self.counts[idx].as_slice())
    }
}

/// One bar of the stacked category-distribution chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryBreakdown {
    pub country: String,
    pub total: usize,
    /// Non-zero category counts in cross-tab column order
    pub categories: Vec<Frequency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Everything the reporter computes about the merged directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub schema: Vec<ColumnInfo>,
    pub describe: Vec<ColumnStats>,
    /// Bar-chart series: most frequent categories
    pub top_categories: Vec<Frequency>,
    pub category_by_country: CrossTab,
    /// Stacked-bar series: category mix of the most frequent countries
    pub top_countries: Vec<CountryBreakdown>,
    pub missing_values: Vec<MissingCount>,
    pub headers: Vec<String>,
    pub missing_category_rows: Vec<Vec<Cell>>,
    pub missing_phone_or_name: usize,
}

impl Report {
    pub fn missing_category_count(&self) -> usize {
        self.missing_category_rows.len()
    }
}

/// Reload a merged workbook and summarize it
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_and_summarize(path: &Path) -> Result<Report> {
    let table = read_sheet(path)?;
    info!("📊 Reloaded {} rows from {}", table.rows.len(), path.display());
    Ok(summarize(&table))
}

/// Compute the full report for a sheet
pub fn summarize(table: &SheetTable) -> Report {
    let category = Field::Category.column();
    let country = Field::Country.column();
    let name = Field::Name.column();

    let schema: Vec<ColumnInfo> = table
        .headers
        .iter()
        .map(|header| ColumnInfo {
            name: header.clone(),
            kind: column_kind(table.column(header)),
            non_missing: table.column(header).filter(|c| !c.is_missing()).count(),
        })
        .collect();

    let describe = schema.iter().map(|info| describe_column(table, info)).collect();

    let mut top_categories = value_counts(table.column(category));
    top_categories.truncate(TOP_CATEGORIES);

    let category_by_country = crosstab(table, country, category);

    let top_countries = value_counts(table.column(country))
        .into_iter()
        .take(TOP_COUNTRIES)
        .map(|freq| CountryBreakdown {
            categories: category_by_country
                .row(&freq.value)
                .map(|counts| {
                    category_by_country
                        .categories
                        .iter()
                        .zip(counts)
                        .filter(|(_, n)| **n > 0)
                        .map(|(c, n)| Frequency {
                            value: c.clone(),
                            count: *n,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            country: freq.value,
            total: freq.count,
        })
        .collect();

    let missing_values = table
        .headers
        .iter()
        .map(|header| MissingCount {
            column: header.clone(),
            missing: table.column(header).filter(|c| c.is_missing()).count(),
        })
        .collect();

    let category_idx = table.column_index(category);
    let missing_category_rows = table
        .rows
        .iter()
        .filter(|row| is_missing_at(row, category_idx))
        .cloned()
        .collect();

    let phone_idx = table.column_index(PHONE_COLUMN);
    let name_idx = table.column_index(name);
    let missing_phone_or_name = table
        .rows
        .iter()
        .filter(|row| is_missing_at(row, phone_idx) || is_missing_at(row, name_idx))
        .count();

    Report {
        generated_at: Utc::now(),
        rows: table.rows.len(),
        schema,
        describe,
        top_categories,
        category_by_country,
        top_countries,
        missing_values,
        headers: table.headers.clone(),
        missing_category_rows,
        missing_phone_or_name,
    }
}

// An absent column counts as missing in every row
fn is_missing_at(row: &[Cell], idx: Option<usize>) -> bool {
    idx.and_then(|i| row.get(i)).map_or(true, Cell::is_missing)
}

fn column_kind<'a>(cells: impl Iterator<Item = &'a Cell>) -> ColumnKind {
    let mut saw_number = false;
    for cell in cells {
        match cell {
            Cell::Missing => {}
            Cell::Number(_) => saw_number = true,
            Cell::Text(_) => return ColumnKind::Text,
        }
    }
    if saw_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

fn describe_column(table: &SheetTable, info: &ColumnInfo) -> ColumnStats {
    match info.kind {
        ColumnKind::Numeric => {
            let mut values: Vec<f64> = table
                .column(&info.name)
                .filter_map(|c| match c {
                    Cell::Number(n) => Some(*n),
                    _ => None,
                })
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            ColumnStats::Numeric {
                column: info.name.clone(),
                count: values.len(),
                mean: mean(&values),
                std: sample_std(&values),
                min: values.first().copied(),
                q25: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q75: quantile(&values, 0.75),
                max: values.last().copied(),
            }
        }
        ColumnKind::Text => {
            let counts = value_counts(table.column(&info.name));
            let top = counts.first().cloned();
            ColumnStats::Text {
                column: info.name.clone(),
                count: counts.iter().map(|f| f.count).sum(),
                unique: counts.len(),
                freq: top.as_ref().map_or(0, |f| f.count),
                top: top.map(|f| f.value),
            }
        }
    }
}

/// Occurrences per non-missing value, most frequent first; ties keep first-seen order
pub fn value_counts<'a>(cells: impl Iterator<Item = &'a Cell>) -> Vec<Frequency> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<Frequency> = Vec::new();
    for key in cells.filter_map(Cell::key) {
        match index.get(&key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(Frequency { value: key, count: 1 });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Count rows per (row_column, col_column) pair; rows missing either are skipped
pub fn crosstab(table: &SheetTable, row_column: &str, col_column: &str) -> CrossTab {
    let (Some(r), Some(c)) = (table.column_index(row_column), table.column_index(col_column)) else {
        return CrossTab::default();
    };

    let mut pairs: BTreeMap<(String, String), usize> = BTreeMap::new();
    for row in &table.rows {
        let key_at = |i: usize| row.get(i).and_then(Cell::key);
        if let (Some(rk), Some(ck)) = (key_at(r), key_at(c)) {
            *pairs.entry((rk, ck)).or_default() += 1;
        }
    }

    let countries: Vec<String> = pairs
        .keys()
        .map(|(r, _)| r.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let categories: Vec<String> = pairs
        .keys()
        .map(|(_, c)| c.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let counts = countries
        .iter()
        .map(|country| {
            categories
                .iter()
                .map(|category| pairs.get(&(country.clone(), category.clone())).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    CrossTab {
        countries,
        categories,
        counts,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sheet() -> SheetTable {
        SheetTable {
            headers: ["phone", "category", "name", "city", "country", "region"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: vec![
                vec![Cell::Number(1.0), text("Bakery"), text("A"), text("berlin"), text("germany"), Cell::Missing],
                vec![Cell::Number(2.0), text("Cafe"), text("B"), text("paris"), text("france"), Cell::Missing],
                vec![Cell::Number(3.0), text("Bakery"), text("C"), text("munich"), text("germany"), text("bavaria")],
                vec![Cell::Number(4.0), Cell::Missing, text("D"), text("rome"), text("italy"), Cell::Missing],
                vec![Cell::Missing, text("Cafe"), Cell::Missing, text("lyon"), text("france"), Cell::Missing],
            ],
        }
    }

    #[test]
    fn test_value_counts_orders_by_count_then_first_seen() {
        let cells = vec![text("b"), text("a"), text("a"), text("b"), text("c"), Cell::Missing];
        let counts = value_counts(cells.iter());

        assert_eq!(counts[0], Frequency { value: "b".into(), count: 2 });
        assert_eq!(counts[1], Frequency { value: "a".into(), count: 2 });
        assert_eq!(counts[2], Frequency { value: "c".into(), count: 1 });
    }

    #[test]
    fn test_crosstab_is_sorted_and_zero_filled() {
        let tab = crosstab(&sheet(), "country", "category");

        assert_eq!(tab.countries, vec!["france", "germany"]);
        assert_eq!(tab.categories, vec!["Bakery", "Cafe"]);
        assert_eq!(tab.counts, vec![vec![0, 2], vec![2, 0]]);
        assert_eq!(tab.row("italy"), None);
    }

    #[test]
    fn test_summarize_counts_missing_values() {
        let report = summarize(&sheet());

        assert_eq!(report.rows, 5);
        assert_eq!(report.missing_category_count(), 1);
        assert_eq!(report.missing_phone_or_name, 1);

        let region = report.missing_values.iter().find(|m| m.column == "region").unwrap();
        assert_eq!(region.missing, 4);
    }

    #[test]
    fn test_summarize_chart_series() {
        let report = summarize(&sheet());

        assert_eq!(report.top_categories[0], Frequency { value: "Bakery".into(), count: 2 });
        assert_eq!(report.top_categories.len(), 2);

        assert_eq!(report.top_countries.len(), 3);
        assert_eq!(report.top_countries[0].country, "germany");
        assert_eq!(report.top_countries[0].categories, vec![Frequency { value: "Bakery".into(), count: 2 }]);
        // italy only has rows without a category
        assert!(report.top_countries[2].categories.is_empty());
    }

    #[test]
    fn test_describe_numeric_phone_column() {
        let report = summarize(&sheet());

        assert_eq!(report.schema[0].kind, ColumnKind::Numeric);
        assert_eq!(report.schema[1].kind, ColumnKind::Text);
        match &report.describe[0] {
            ColumnStats::Numeric { count, mean, median, q25, min, max, .. } => {
                assert_eq!(*count, 4);
                assert_eq!(*mean, Some(2.5));
                assert_eq!(*median, Some(2.5));
                assert_eq!(*q25, Some(1.75));
                assert_eq!(*min, Some(1.0));
                assert_eq!(*max, Some(4.0));
            }
            other => panic!("expected numeric stats, got {:?}", other),
        }
    }

    #[test]
    fn test_describe_text_column() {
        let report = summarize(&sheet());
        match &report.describe[4] {
            ColumnStats::Text { count, unique, top, freq, .. } => {
                assert_eq!(*count, 5);
                assert_eq!(*unique, 3);
                assert_eq!(top.as_deref(), Some("germany"));
                assert_eq!(*freq, 2);
            }
            other => panic!("expected text stats, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sheet_summarizes_cleanly() {
        let report = summarize(&SheetTable::default());
        assert_eq!(report.rows, 0);
        assert!(report.top_categories.is_empty());
        assert_eq!(report.category_by_country, CrossTab::default());
    }
}
