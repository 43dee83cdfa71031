use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

use crate::constants::SENTINEL_NULL;
use crate::domain::{Field, Listing, MergedListing, Phone, Source};
use crate::observability::metrics;
use crate::pipeline::processing::normalize::NormalizedTable;

/// Sources consulted for one field, highest priority first
#[derive(Debug, Clone, Copy)]
pub struct FieldPriority {
    pub field: Field,
    pub sources: &'static [Source],
}

const FULL_CHAIN: &[Source] = &[Source::Website, Source::Google, Source::Facebook];

/// Website beats google beats facebook. Facebook carries no region, so the
/// region chain stops at google and falls through to the sentinel.
pub const COALESCE_POLICY: &[FieldPriority] = &[
    FieldPriority { field: Field::Name, sources: FULL_CHAIN },
    FieldPriority { field: Field::Category, sources: FULL_CHAIN },
    FieldPriority { field: Field::City, sources: FULL_CHAIN },
    FieldPriority { field: Field::Country, sources: FULL_CHAIN },
    FieldPriority { field: Field::Region, sources: &[Source::Website, Source::Google] },
];

/// Row counts from one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Distinct phones across all sources after the outer join
    pub joined_rows: usize,
    /// Rows removed because no source supplied a usable name
    pub dropped_without_name: usize,
    pub output_rows: usize,
}

/// Every source's row for one phone
pub type JoinedRow<'a> = HashMap<Source, &'a Listing>;

/// Full outer join of the tables on phone, ordered by ascending phone
pub fn outer_join(tables: &[NormalizedTable]) -> BTreeMap<Phone, JoinedRow<'_>> {
    let mut joined: BTreeMap<Phone, JoinedRow<'_>> = BTreeMap::new();
    for table in tables {
        for row in &table.rows {
            // Tables are phone-unique, so a later row never overwrites one from the same source
            joined.entry(row.phone).or_default().insert(table.source, row);
        }
    }
    joined
}

/// First usable value along the priority chain, else the sentinel
pub fn coalesce(candidates: &JoinedRow<'_>, priority: &FieldPriority) -> String {
    priority
        .sources
        .iter()
        .find_map(|source| candidates.get(source).and_then(|row| row.usable(priority.field)))
        .unwrap_or(SENTINEL_NULL)
        .to_string()
}

/// Merge the normalized sources into one directory.
///
/// Rows whose coalesced name is the sentinel are dropped.
#[instrument(skip_all)]
pub fn merge_sources(tables: &[NormalizedTable], policy: &[FieldPriority]) -> (Vec<MergedListing>, MergeReport) {
    let joined = outer_join(tables);
    let mut report = MergeReport {
        joined_rows: joined.len(),
        ..Default::default()
    };

    let mut merged = Vec::with_capacity(joined.len());
    for (phone, candidates) in &joined {
        let mut row = MergedListing {
            phone: *phone,
            category: SENTINEL_NULL.to_string(),
            name: SENTINEL_NULL.to_string(),
            city: SENTINEL_NULL.to_string(),
            country: SENTINEL_NULL.to_string(),
            region: SENTINEL_NULL.to_string(),
        };
        for priority in policy {
            row.set(priority.field, coalesce(candidates, priority));
        }

        if row.name == SENTINEL_NULL {
            debug!(phone = %phone, "Dropping merged row without a usable name");
            report.dropped_without_name += 1;
            continue;
        }
        merged.push(row);
    }

    report.output_rows = merged.len();
    metrics::merge::rows_joined(report.joined_rows);
    metrics::merge::rows_dropped_without_name(report.dropped_without_name);
    metrics::merge::rows_merged(report.output_rows);

    info!(
        "🔗 Merged {} distinct phones into {} listings ({} without a usable name)",
        report.joined_rows, report.output_rows, report.dropped_without_name
    );

    (merged, report)
}
