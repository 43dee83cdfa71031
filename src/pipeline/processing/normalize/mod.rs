pub mod phone;
pub mod profiles;
pub mod registry;
pub mod text;

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument};

use crate::constants::SENTINEL_NULL;
use crate::domain::{Field, Listing, Phone, Source};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::ingestion::RawTable;

pub use profiles::SourceProfile;
pub use registry::NormalizationRegistry;

/// Free-text cleanup runs over the attributes in this order
pub const CLEANUP_ORDER: [Field; 5] = [Field::Name, Field::Category, Field::City, Field::Country, Field::Region];

/// A normalized source table: unique phones, every field filled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTable {
    pub source: Source,
    /// Fields this source carries, in output column order
    pub fields: Vec<Field>,
    pub rows: Vec<Listing>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Run every value through `unicode_escape` again (the pre-export pass)
    pub fn escaped(mut self) -> Self {
        for row in &mut self.rows {
            for value in row.values.values_mut() {
                *value = text::unicode_escape(value);
            }
        }
        self
    }
}

/// Row counts dropped at each normalization step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub input_rows: usize,
    pub missing_phone: usize,
    pub duplicate_phone: usize,
    pub escape_artifacts: usize,
    pub output_rows: usize,
}

/// A projected row before the phone requirement and fill are applied
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRow {
    pub phone: Option<Phone>,
    pub values: BTreeMap<Field, Option<String>>,
}

/// Trait for turning one raw source table into a normalized one
pub trait SourceNormalizer {
    fn source(&self) -> Source;

    fn normalize(&self, raw: RawTable) -> Result<(NormalizedTable, NormalizeReport)>;
}

/// Profile-driven normalizer shared by all three sources
pub struct DefaultNormalizer {
    pub profile: &'static SourceProfile,
}

impl DefaultNormalizer {
    pub fn new(profile: &'static SourceProfile) -> Self {
        Self { profile }
    }
}

impl SourceNormalizer for DefaultNormalizer {
    fn source(&self) -> Source {
        self.profile.source
    }

    #[instrument(skip_all, fields(source = %self.profile.source))]
    fn normalize(&self, raw: RawTable) -> Result<(NormalizedTable, NormalizeReport)> {
        let profile = self.profile;
        let mut report = NormalizeReport {
            input_rows: raw.len(),
            ..Default::default()
        };

        let raw = if profile.escape_on_load {
            escape_table(raw)
        } else {
            raw
        };

        let staged = project(&raw, profile)?;
        let staged_count = staged.len();
        let staged = drop_missing_phone(staged);
        report.missing_phone = staged_count - staged.len();

        let staged = lowercase_locations(staged);
        let rows = fill_missing(staged);

        let before_dedup = rows.len();
        let mut rows = dedup_by_phone(rows);
        report.duplicate_phone = before_dedup - rows.len();

        for field in CLEANUP_ORDER {
            if !profile.has_field(field) {
                continue;
            }
            let before = rows.len();
            rows = clean_column(rows, field);
            report.escape_artifacts += before - rows.len();
        }

        report.output_rows = rows.len();
        let source = profile.source.label();
        metrics::normalize::rows_dropped(source, "missing_phone", report.missing_phone);
        metrics::normalize::rows_dropped(source, "duplicate_phone", report.duplicate_phone);
        metrics::normalize::rows_dropped(source, "escape_artifact", report.escape_artifacts);
        metrics::normalize::rows_normalized(source, report.output_rows);

        info!(
            "🔧 Normalized {}: {} -> {} rows ({} missing phone, {} duplicate phone, {} escape artifacts)",
            source,
            report.input_rows,
            report.output_rows,
            report.missing_phone,
            report.duplicate_phone,
            report.escape_artifacts
        );

        Ok((
            NormalizedTable {
                source: profile.source,
                fields: profile.fields().collect(),
                rows,
            },
            report,
        ))
    }
}

/// Escape every present cell of a raw table
pub fn escape_table(raw: RawTable) -> RawTable {
    raw.map_cells(text::unicode_escape)
}

/// Select the profile's columns, rename them onto the common schema and
/// coerce the phone column
pub fn project(raw: &RawTable, profile: &SourceProfile) -> Result<Vec<StagedRow>> {
    let missing_column = |column: &str| PipelineError::MissingColumn {
        dataset: profile.source.label().to_string(),
        column: column.to_string(),
    };

    let phone_idx = raw
        .column_index(profile.phone_column)
        .ok_or_else(|| missing_column(profile.phone_column))?;
    let field_idx = profile
        .columns
        .iter()
        .map(|(field, column)| {
            raw.column_index(column)
                .map(|idx| (*field, idx))
                .ok_or_else(|| missing_column(column))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(raw
        .rows
        .iter()
        .map(|row| StagedRow {
            phone: row[phone_idx].as_deref().and_then(phone::parse_phone),
            values: field_idx
                .iter()
                .map(|(field, idx)| (*field, row[*idx].clone()))
                .collect(),
        })
        .collect())
}

pub fn drop_missing_phone(rows: Vec<StagedRow>) -> Vec<StagedRow> {
    rows.into_iter()
        .filter(|row| {
            if row.phone.is_none() {
                debug!("Dropping row without a usable phone");
            }
            row.phone.is_some()
        })
        .collect()
}

/// Lowercase city, country and region; missing values stay missing
pub fn lowercase_locations(mut rows: Vec<StagedRow>) -> Vec<StagedRow> {
    for row in &mut rows {
        for (field, value) in row.values.iter_mut() {
            if field.is_case_folded() {
                if let Some(v) = value {
                    *v = v.to_lowercase();
                }
            }
        }
    }
    rows
}

/// Replace every missing non-phone value with the sentinel.
/// Expects `drop_missing_phone` to have run; the `?` on the phone only
/// narrows `Option<Phone>` to `Phone`.
pub fn fill_missing(rows: Vec<StagedRow>) -> Vec<Listing> {
    rows.into_iter()
        .filter_map(|row| {
            let phone = row.phone?;
            let values = row
                .values
                .into_iter()
                .map(|(field, value)| (field, value.unwrap_or_else(|| SENTINEL_NULL.to_string())))
                .collect();
            Some(Listing { phone, values })
        })
        .collect()
}

/// Keep the first row for every phone
pub fn dedup_by_phone(rows: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.phone)).collect()
}

/// Drop rows whose `field` still carries a `\u`/`\x` artifact, then collapse
/// pipe-delimited multi-values. Values that trim to nothing become the sentinel.
pub fn clean_column(rows: Vec<Listing>, field: Field) -> Vec<Listing> {
    rows.into_iter()
        .filter(|row| {
            let artifact = row.get(field).is_some_and(text::has_escape_artifact);
            if artifact {
                debug!(phone = %row.phone, "Dropping row with escape artifact in {}", field);
            }
            !artifact
        })
        .map(|mut row| {
            if let Some(value) = row.values.get_mut(&field) {
                let collapsed = text::collapse_multi_value(value);
                *value = if collapsed.is_empty() {
                    SENTINEL_NULL.to_string()
                } else {
                    collapsed
                };
            }
            row
        })
        .collect()
}
