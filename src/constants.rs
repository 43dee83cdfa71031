//! File name and sentinel constants to ensure consistency across the codebase

/// In-band marker for "value absent" in every non-phone column
pub const SENTINEL_NULL: &str = "NULL";

// Input datasets
pub const GOOGLE_INPUT: &str = "google_dataset.csv";
pub const FACEBOOK_INPUT: &str = "facebook_dataset.csv";
pub const WEBSITE_INPUT: &str = "website_dataset.csv";

// Per-source workbooks (inspection only, never read back)
pub const GOOGLE_EXPORT: &str = "google_data_excel.xlsx";
pub const FACEBOOK_EXPORT: &str = "facebook_data_excel.xlsx";
pub const WEBSITE_EXPORT: &str = "website_data_excel.xlsx";

/// The merged directory
pub const MERGED_EXPORT: &str = "dataset_4.xlsx";

/// Name of the phone column in every input and output table
pub const PHONE_COLUMN: &str = "phone";

/// Cell values that load as missing, matching the usual CSV/Excel NA spellings
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Longest string a workbook cell accepts
pub const MAX_CELL_CHARS: usize = 32_767;

/// Rows shown by the category frequency table
pub const TOP_CATEGORIES: usize = 10;
/// Countries in the stacked category-distribution series
pub const TOP_COUNTRIES: usize = 5;
/// Cross-tab rows echoed to the console
pub const CROSSTAB_PREVIEW_ROWS: usize = 10;

/// True when `value` is one of the NA spellings
pub fn is_na_token(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}
