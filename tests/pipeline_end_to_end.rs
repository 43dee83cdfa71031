use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use listing_merger::config::Config;
use listing_merger::domain::Source;
use listing_merger::error::Result as PipelineResult;
use listing_merger::pipeline::ingestion::RawTable;
use listing_merger::pipeline::normalize::{
    profiles, NormalizationRegistry, NormalizeReport, NormalizedTable, SourceNormalizer,
};
use listing_merger::pipeline::storage::{read_sheet, Cell, SheetTable};
use listing_merger::pipeline::Pipeline;
use listing_merger::report::summarize;

const GOOGLE: &str = "\
phone,category,name,city,country_name,region_name
1001,Bakery,Acme Bakery,Berlin,Germany,Berlin
1002,Cafe|Coffee|Tea,Beta Cafe,Paris,France,
1001,Dup,Dup Name,X,Y,Z
not-a-phone,Bar,Bad,Rome,Italy,Lazio
1003,Bar,Gamma,Rome
1004,,,Madrid,Spain,
";

const FACEBOOK: &str = "\
phone,categories,name,city,country_name
1001,Food,FB Acme,berlin,germany
1005,Shop,Delta Shop,LONDON,UK
1005,Shop,Delta Dup,x,y
abc,Shop,Bad,x,y
1006,a,b,c,d,e
1004,,,,
";

const WEBSITE: &str = "\
phone;s_category;legal_name;main_city;main_country;main_region
1002;Coffee Shop;Beta Ltd;PARIS;France;Ile-de-France
1007;Pub;Müller Pub;Munich;Germany;Bavaria
1001;;;;;
12ab;Shop;Bad;a;b;c
1008;only;three
'1009;Gym;Fit Gym;Oslo;Norway;Oslo
1002;Other;Other Ltd;a;b;c
";

fn write_fixtures(dir: &Path) -> Result<()> {
    fs::write(dir.join("google_dataset.csv"), GOOGLE)?;
    fs::write(dir.join("facebook_dataset.csv"), FACEBOOK)?;
    fs::write(dir.join("website_dataset.csv"), WEBSITE)?;
    Ok(())
}

fn config_for(data_dir: &Path, output_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        ..Config::default()
    }
}

fn text_at(sheet: &SheetTable, row: usize, column: &str) -> Option<String> {
    let idx = sheet.column_index(column)?;
    sheet.rows[row][idx].as_text().map(str::to_string)
}

#[test]
fn test_full_pipeline_produces_expected_directory() -> Result<()> {
    let data = tempdir()?;
    let out = tempdir()?;
    write_fixtures(data.path())?;

    let result = Pipeline::new(config_for(data.path(), out.path())).run()?;

    assert_eq!(result.merge.joined_rows, 5);
    assert_eq!(result.merge.dropped_without_name, 1);
    assert_eq!(result.merge.output_rows, 4);

    let sheet = read_sheet(&result.merged_file)?;
    assert_eq!(sheet.headers, vec!["phone", "category", "name", "city", "country", "region"]);

    let phones: Vec<Cell> = sheet.column("phone").cloned().collect();
    assert_eq!(
        phones,
        vec![
            Cell::Number(1001.0),
            Cell::Number(1002.0),
            Cell::Number(1005.0),
            Cell::Number(1009.0)
        ]
    );

    // website row for 1001 is empty, so google fills every field
    assert_eq!(text_at(&sheet, 0, "name").as_deref(), Some("Acme Bakery"));
    assert_eq!(text_at(&sheet, 0, "category").as_deref(), Some("Bakery"));
    assert_eq!(text_at(&sheet, 0, "city").as_deref(), Some("berlin"));
    assert_eq!(text_at(&sheet, 0, "region").as_deref(), Some("berlin"));

    // website beats google
    assert_eq!(text_at(&sheet, 1, "name").as_deref(), Some("Beta Ltd"));
    assert_eq!(text_at(&sheet, 1, "category").as_deref(), Some("Coffee Shop"));
    assert_eq!(text_at(&sheet, 1, "region").as_deref(), Some("ile-de-france"));

    // facebook only: no region anywhere
    assert_eq!(text_at(&sheet, 2, "name").as_deref(), Some("Delta Shop"));
    assert_eq!(text_at(&sheet, 2, "country").as_deref(), Some("uk"));
    assert!(sheet.rows[2][5].is_missing());

    assert_eq!(text_at(&sheet, 3, "city").as_deref(), Some("oslo"));

    assert!(sheet.column("name").all(|c| !c.is_missing()));
    Ok(())
}

#[test]
fn test_source_reports_count_every_drop() -> Result<()> {
    let data = tempdir()?;
    let out = tempdir()?;
    write_fixtures(data.path())?;

    let pipeline = Pipeline::new(config_for(data.path(), out.path()));
    let (tables, outcomes) = pipeline.process_sources()?;
    assert_eq!(tables.len(), 3);

    let website = outcomes.iter().find(|o| o.source == Source::Website).unwrap();
    assert_eq!(website.normalize.input_rows, 6);
    assert_eq!(website.normalize.missing_phone, 1);
    assert_eq!(website.normalize.duplicate_phone, 1);
    assert_eq!(website.normalize.escape_artifacts, 1);
    assert_eq!(website.normalize.output_rows, 3);

    let google = outcomes.iter().find(|o| o.source == Source::Google).unwrap();
    assert_eq!(google.normalize.input_rows, 5);
    assert_eq!(google.normalize.output_rows, 3);

    let google_sheet = read_sheet(&google.output_file)?;
    assert_eq!(google_sheet.rows.len(), 3);
    assert_eq!(text_at(&google_sheet, 1, "category").as_deref(), Some("Cafe"));

    let facebook_sheet = read_sheet(&out.path().join("facebook_data_excel.xlsx"))?;
    assert_eq!(facebook_sheet.headers, vec!["phone", "category", "name", "city", "country"]);
    Ok(())
}

#[test]
fn test_report_over_merged_workbook() -> Result<()> {
    let data = tempdir()?;
    let out = tempdir()?;
    write_fixtures(data.path())?;

    let result = Pipeline::new(config_for(data.path(), out.path())).run()?;
    let report = summarize(&read_sheet(&result.merged_file)?);

    assert_eq!(report.rows, 4);
    assert_eq!(report.missing_phone_or_name, 0);
    assert_eq!(report.missing_category_count(), 0);
    assert_eq!(report.top_countries[0].country, "germany");
    let region = report.missing_values.iter().find(|m| m.column == "region").unwrap();
    assert_eq!(region.missing, 1);
    Ok(())
}

#[test]
fn test_missing_input_file_is_an_error() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();

    let result = Pipeline::new(config_for(data.path(), out.path())).run();
    assert!(result.is_err());
}

/// Discards every facebook row
struct SilentFacebook;

impl SourceNormalizer for SilentFacebook {
    fn source(&self) -> Source {
        Source::Facebook
    }

    fn normalize(&self, raw: RawTable) -> PipelineResult<(NormalizedTable, NormalizeReport)> {
        Ok((
            NormalizedTable {
                source: Source::Facebook,
                fields: profiles::FACEBOOK.fields().collect(),
                rows: Vec::new(),
            },
            NormalizeReport {
                input_rows: raw.len(),
                ..Default::default()
            },
        ))
    }
}

#[test]
fn test_custom_registry_replaces_source_normalizer() -> Result<()> {
    let data = tempdir()?;
    let out = tempdir()?;
    write_fixtures(data.path())?;

    let mut registry = NormalizationRegistry::new();
    registry.register(Box::new(SilentFacebook));
    let result = Pipeline::with_registry(config_for(data.path(), out.path()), registry).run()?;

    let facebook = result.sources.iter().find(|o| o.source == Source::Facebook).unwrap();
    assert_eq!(facebook.normalize.input_rows, 5);
    assert_eq!(facebook.normalize.output_rows, 0);

    // 1005 only ever came from facebook
    assert_eq!(result.merge.joined_rows, 4);
    assert_eq!(result.merge.output_rows, 3);
    let sheet = read_sheet(&result.merged_file)?;
    assert!(sheet.column("phone").all(|c| *c != Cell::Number(1005.0)));
    Ok(())
}

fn exported_facebook_name(double_escape: bool) -> Result<String> {
    let data = tempdir()?;
    let out = tempdir()?;
    write_fixtures(data.path())?;
    fs::write(
        data.path().join("facebook_dataset.csv"),
        "phone,categories,name,city,country_name\n2001,Shop,Back\\Slash,Oslo,Norway\n",
    )?;

    let config = Config {
        double_escape_on_export: double_escape,
        ..config_for(data.path(), out.path())
    };
    let (_, outcome) = Pipeline::new(config).process_source(Source::Facebook)?;
    let sheet = read_sheet(&outcome.output_file)?;
    Ok(text_at(&sheet, 0, "name").unwrap_or_default())
}

#[test]
fn test_export_escaping_follows_config_flag() -> Result<()> {
    assert_eq!(exported_facebook_name(false)?, "Back\\\\Slash");
    assert_eq!(exported_facebook_name(true)?, "Back\\\\\\\\Slash");
    Ok(())
}
