//! Integration tests for the tree-sitter lowering and the full per-file
//! analysis over the fixture sources.

use std::path::PathBuf;

use modernity::aggregate;
use modernity::catalog::{self, counters, CsVersion};
use modernity::parser::{CSharpParser, SourceParser};

fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

#[test]
fn lowers_fixture_sources() {
    let parser = CSharpParser::new();

    let modern = parser.parse_file(&testdata("Modern.cs")).unwrap();
    assert!(modern.len() > 10, "expected a populated tree");

    let legacy = parser.parse_file(&testdata("Legacy.cs")).unwrap();
    assert!(legacy.len() > 10, "expected a populated tree");
}

#[test]
fn modern_fixture_counts_expected_features() {
    let parser = CSharpParser::new();
    let files = vec![testdata("Modern.cs")];

    let result = aggregate::analyze_commit(&parser, &files, "01-06-2024").unwrap();

    // Full catalog shape regardless of what fired.
    assert_eq!(result.versions.len(), catalog::CATALOG.len());

    assert_eq!(result.count(CsVersion::V9_0, counters::RECORDS), Some(2));
    assert_eq!(
        result.count(CsVersion::V7_2, counters::PRIVATE_PROTECTED),
        Some(1)
    );
    assert_eq!(
        result.count(CsVersion::V7_2, counters::DIGIT_SEPARATORS),
        Some(1)
    );
}

#[test]
fn legacy_fixture_stays_quiet_on_modern_counters() {
    let parser = CSharpParser::new();
    let files = vec![testdata("Legacy.cs")];

    let result = aggregate::analyze_commit(&parser, &files, "01-06-2024").unwrap();

    assert_eq!(result.count(CsVersion::V9_0, counters::RECORDS), Some(0));
    assert_eq!(
        result.count(CsVersion::V11_0, counters::RAW_STRING_LITERALS),
        Some(0)
    );
    assert_eq!(
        result.count(CsVersion::V12_0, counters::COLLECTION_EXPRESSIONS),
        Some(0)
    );
}

#[test]
fn analyzing_the_same_fixture_twice_doubles_counts() {
    let parser = CSharpParser::new();
    let files = vec![testdata("Modern.cs"), testdata("Modern.cs")];

    let result = aggregate::analyze_commit(&parser, &files, "01-06-2024").unwrap();
    assert_eq!(result.count(CsVersion::V9_0, counters::RECORDS), Some(4));
}
