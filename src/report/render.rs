use std::fs;
use std::path::Path;
use tracing::info;

use super::{ColumnStats, Report};
use crate::constants::CROSSTAB_PREVIEW_ROWS;
use crate::error::Result;
use crate::pipeline::storage::Cell;

/// Print the report to stdout
pub fn print_report(report: &Report) {
    println!("📊 Merged directory: {} rows", report.rows);
    println!("{}", "=".repeat(60));

    println!("\n📋 Columns:");
    for column in &report.schema {
        println!("   {:<10} {:<8} {} non-missing", column.name, kind_label(column), column.non_missing);
    }

    println!("\n📈 Summary statistics:");
    for stats in &report.describe {
        match stats {
            ColumnStats::Numeric {
                column,
                count,
                mean,
                std,
                min,
                q25,
                median,
                q75,
                max,
            } => {
                println!(
                    "   {}: count={} mean={} std={} min={} 25%={} 50%={} 75%={} max={}",
                    column,
                    count,
                    fmt_num(*mean),
                    fmt_num(*std),
                    fmt_num(*min),
                    fmt_num(*q25),
                    fmt_num(*median),
                    fmt_num(*q75),
                    fmt_num(*max)
                );
            }
            ColumnStats::Text {
                column,
                count,
                unique,
                top,
                freq,
            } => {
                println!(
                    "   {}: count={} unique={} top={} freq={}",
                    column,
                    count,
                    unique,
                    top.as_deref().unwrap_or("-"),
                    freq
                );
            }
        }
    }

    println!("\n🏷️  Top categories:");
    for freq in &report.top_categories {
        println!("   {:>6}  {}", freq.count, freq.value);
    }

    let tab = &report.category_by_country;
    println!(
        "\n🌍 Category by country ({} countries × {} categories, first {} shown):",
        tab.countries.len(),
        tab.categories.len(),
        CROSSTAB_PREVIEW_ROWS
    );
    for (country, counts) in tab.countries.iter().zip(&tab.counts).take(CROSSTAB_PREVIEW_ROWS) {
        let cells: Vec<String> = tab
            .categories
            .iter()
            .zip(counts)
            .filter(|(_, n)| **n > 0)
            .map(|(c, n)| format!("{}={}", c, n))
            .collect();
        println!("   {}: {}", country, cells.join(", "));
    }

    println!("\n🏆 Top countries:");
    for country in &report.top_countries {
        println!("   {} ({} listings)", country.country, country.total);
        for category in &country.categories {
            println!("      - {}: {}", category.value, category.count);
        }
    }

    println!("\n🕳️  Missing values:");
    for missing in &report.missing_values {
        println!("   {:<10} {}", missing.column, missing.missing);
    }

    println!("\n⚠️  Rows with missing category: {}", report.missing_category_count());
    for row in &report.missing_category_rows {
        let cells: Vec<String> = report
            .headers
            .iter()
            .zip(row)
            .map(|(h, c)| format!("{}={}", h, fmt_cell(c)))
            .collect();
        println!("   - {}", cells.join(" | "));
    }

    println!("\n⚠️  Rows missing phone or name: {}", report.missing_phone_or_name);
}

/// Write the report as pretty-printed JSON
pub fn write_json(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    info!("📝 Wrote report to {}", path.display());
    Ok(())
}

fn kind_label(column: &super::ColumnInfo) -> &'static str {
    match column.kind {
        super::ColumnKind::Numeric => "numeric",
        super::ColumnKind::Text => "text",
    }
}

fn fmt_num(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| format!("{:.2}", v))
}

fn fmt_cell(cell: &Cell) -> String {
    cell.key().unwrap_or_else(|| "NaN".to_string())
}
