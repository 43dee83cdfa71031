use crate::constants;
use crate::domain::{Field, Source};

/// Everything that differs between the three sources
#[derive(Debug, Clone, Copy)]
pub struct SourceProfile {
    pub source: Source,
    pub input_file: &'static str,
    pub export_file: &'static str,
    pub delimiter: u8,
    pub phone_column: &'static str,
    /// Source column feeding each common field, in output column order
    pub columns: &'static [(Field, &'static str)],
    /// Escape every cell of the raw table before projecting
    pub escape_on_load: bool,
    /// Escape the normalized table once more right before it is exported
    pub escape_before_export: bool,
}

impl SourceProfile {
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.columns.iter().map(|(field, _)| *field)
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.columns.iter().any(|(f, _)| *f == field)
    }
}

pub const GOOGLE: SourceProfile = SourceProfile {
    source: Source::Google,
    input_file: constants::GOOGLE_INPUT,
    export_file: constants::GOOGLE_EXPORT,
    delimiter: b',',
    phone_column: constants::PHONE_COLUMN,
    columns: &[
        (Field::Category, "category"),
        (Field::Name, "name"),
        (Field::City, "city"),
        (Field::Country, "country_name"),
        (Field::Region, "region_name"),
    ],
    escape_on_load: false,
    escape_before_export: false,
};

// No region column on this source; the merge fills it.
pub const FACEBOOK: SourceProfile = SourceProfile {
    source: Source::Facebook,
    input_file: constants::FACEBOOK_INPUT,
    export_file: constants::FACEBOOK_EXPORT,
    delimiter: b',',
    phone_column: constants::PHONE_COLUMN,
    columns: &[
        (Field::Category, "categories"),
        (Field::Name, "name"),
        (Field::City, "city"),
        (Field::Country, "country_name"),
    ],
    escape_on_load: true,
    escape_before_export: true,
};

pub const WEBSITE: SourceProfile = SourceProfile {
    source: Source::Website,
    input_file: constants::WEBSITE_INPUT,
    export_file: constants::WEBSITE_EXPORT,
    delimiter: b';',
    phone_column: constants::PHONE_COLUMN,
    columns: &[
        (Field::Category, "s_category"),
        (Field::Name, "legal_name"),
        (Field::City, "main_city"),
        (Field::Country, "main_country"),
        (Field::Region, "main_region"),
    ],
    escape_on_load: true,
    escape_before_export: true,
};

pub fn profile(source: Source) -> &'static SourceProfile {
    match source {
        Source::Google => &GOOGLE,
        Source::Facebook => &FACEBOOK,
        Source::Website => &WEBSITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_facebook_lacks_region() {
        assert!(GOOGLE.has_field(Field::Region));
        assert!(WEBSITE.has_field(Field::Region));
        assert!(!FACEBOOK.has_field(Field::Region));
    }

    #[test]
    fn test_website_is_semicolon_delimited() {
        assert_eq!(profile(Source::Website).delimiter, b';');
        assert_eq!(profile(Source::Google).delimiter, b',');
    }
}
