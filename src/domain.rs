use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::constants::SENTINEL_NULL;

/// The three listing providers feeding the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Search/maps provider
    Google,
    /// Social-network provider
    Facebook,
    /// Generic website crawl
    Website,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Google, Source::Facebook, Source::Website];

    pub fn label(&self) -> &'static str {
        match self {
            Source::Google => "google",
            Source::Facebook => "facebook",
            Source::Website => "website",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Non-phone attributes of the common schema, in output column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Category,
    Name,
    City,
    Country,
    Region,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Category, Field::Name, Field::City, Field::Country, Field::Region];

    /// Column name in the common schema
    pub fn column(&self) -> &'static str {
        match self {
            Field::Category => "category",
            Field::Name => "name",
            Field::City => "city",
            Field::Country => "country",
            Field::Region => "region",
        }
    }

    /// Location fields are compared case-insensitively, so they are stored lowercased
    pub fn is_case_folded(&self) -> bool {
        matches!(self, Field::City | Field::Country | Field::Region)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A phone number coerced to a number.
///
/// Always finite. Equality, hashing and ordering go through the numeric
/// value so `5551234.0` and `5551234` are the same key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Phone(f64);

impl Phone {
    /// Wraps a finite value; `-0.0` is folded to `0.0`
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Phone(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for Phone {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Phone {}

impl Hash for Phone {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Phone {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Phone {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e18 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One normalized row from a single source.
///
/// `values` only holds the fields the source actually carries; a source
/// without a region column has no `Field::Region` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub phone: Phone,
    pub values: BTreeMap<Field, String>,
}

impl Listing {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(|s| s.as_str())
    }

    /// Like `get`, but the sentinel counts as absent
    pub fn usable(&self, field: Field) -> Option<&str> {
        self.get(field).filter(|v| *v != SENTINEL_NULL)
    }
}

/// One row of the final directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedListing {
    pub phone: Phone,
    pub category: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub region: String,
}

impl MergedListing {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Category => &self.category,
            Field::Name => &self.name,
            Field::City => &self.city,
            Field::Country => &self.country,
            Field::Region => &self.region,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Category => self.category = value,
            Field::Name => self.name = value,
            Field::City => self.city = value,
            Field::Country => self.country = value,
            Field::Region => self.region = value,
        }
    }
}
