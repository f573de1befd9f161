//! Integration tests for the complete build pass
//!
//! Tests the full flow over a cached results document:
//! - Config loading
//! - Cache replay
//! - Term and class builds
//! - Export to disk

use ohdab_core::{
    run, BuildMode, CachedSource, CachingSource, OutputFormat, QueryResults, Result, RowSource,
    TaxonomyConfig, TaxonomyError,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FETCH_RESULT: &str = r#"{
  "head": {
    "vars": ["OhdAB_ID", "OhdAB_Schluessel", "OhdAB_SchluesselLabel", "Normansetzung",
             "OhdAB_01", "OhdAB_01Label", "OhdAB_02", "OhdAB_02Label"]
  },
  "results": {
    "bindings": [
      {
        "OhdAB_ID": { "type": "literal", "value": "01-01-01-01" },
        "OhdAB_Schluessel": { "type": "uri", "value": "https://database.factgrid.de/entity/Q100" },
        "OhdAB_SchluesselLabel": { "xml:lang": "de", "type": "literal", "value": "Stadtschreiber" },
        "Normansetzung": { "xml:lang": "de", "type": "literal", "value": "Stadtschreiber" },
        "OhdAB_01": { "type": "uri", "value": "https://database.factgrid.de/entity/Q10" },
        "OhdAB_01Label": { "xml:lang": "de", "type": "literal", "value": "Schreiber" },
        "OhdAB_02": { "type": "uri", "value": "https://database.factgrid.de/entity/Q1" },
        "OhdAB_02Label": { "xml:lang": "de", "type": "literal", "value": "Verwaltung" }
      },
      {
        "OhdAB_ID": { "type": "literal", "value": "01-01-01-02" },
        "OhdAB_Schluessel": { "type": "uri", "value": "https://database.factgrid.de/entity/Q101" },
        "OhdAB_SchluesselLabel": { "xml:lang": "de", "type": "literal", "value": "Ratsschreiber" },
        "OhdAB_01": { "type": "uri", "value": "https://database.factgrid.de/entity/Q10" },
        "OhdAB_01Label": { "xml:lang": "de", "type": "literal", "value": "Schreiber" },
        "OhdAB_02": { "type": "uri", "value": "https://database.factgrid.de/entity/Q1" },
        "OhdAB_02Label": { "xml:lang": "de", "type": "literal", "value": "Verwaltung" }
      },
      {
        "OhdAB_Schluessel": { "type": "uri", "value": "https://database.factgrid.de/entity/Q200" },
        "OhdAB_SchluesselLabel": { "xml:lang": "de", "type": "literal", "value": "Bürgermeister" }
      }
    ]
  }
}"#;

/// Inner source that must never be reached
struct Unreachable;

impl RowSource for Unreachable {
    fn fetch(&self) -> Result<QueryResults> {
        panic!("cache should have been used");
    }

    fn describe(&self) -> String {
        "unreachable".to_string()
    }
}

fn setup(temp: &Path) -> TaxonomyConfig {
    let cache = temp.join("resources").join("fetchresult.json");
    fs::create_dir_all(cache.parent().unwrap()).unwrap();
    fs::write(&cache, FETCH_RESULT).unwrap();

    let mut config = TaxonomyConfig::default();
    config.source.cache_file = cache;
    config.output.path = temp.join("OhdAB.ttl");
    config
}

#[test]
fn test_class_build_from_cache() {
    let temp = TempDir::new().unwrap();
    let config = setup(temp.path());

    let source = CachingSource::new(Unreachable, config.source.cache_file.clone());
    let report = run(&config, &source).unwrap();

    assert_eq!(report.mode, BuildMode::Class);
    assert_eq!(report.stats.records, 3);
    // Q100, Q101, Q10, Q1, Q200
    assert_eq!(report.stats.nodes, 5);
    // Q100→Q10, Q101→Q10, Q10→Q1
    assert_eq!(report.stats.edges, 3);
    assert_eq!(report.stats.label_overwrites, 0);

    let turtle = fs::read_to_string(&config.output.path).unwrap();
    assert!(turtle.contains("subClassOf"));
    assert!(turtle.contains("\"Bürgermeister\"@de"));
    assert!(turtle.contains("Ontology"));
}

#[test]
fn test_term_build_to_ntriples() {
    let temp = TempDir::new().unwrap();
    let mut config = setup(temp.path());
    config.output.mode = BuildMode::Term;
    config.output.format = OutputFormat::NTriples;
    config.output.path = temp.path().join("out").join("OhdAB.nt");

    let report = run(&config, &CachedSource::new(config.source.cache_file.clone())).unwrap();
    let nt = fs::read_to_string(&config.output.path).unwrap();

    assert_eq!(nt.lines().count(), report.triples);
    assert!(nt.contains(
        "<https://database.factgrid.de/entity/Q100> <https://database.factgrid.de/broader> <https://database.factgrid.de/entity/Q10> ."
    ));
    assert!(nt.contains("<https://database.factgrid.de/altLabel> \"01-01-01-01\"@de"));
    // Key labels are class-mode only
    assert!(!nt.contains("Ratsschreiber"));
}

#[test]
fn test_rebuild_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let config = setup(temp.path());
    let source = CachedSource::new(config.source.cache_file.clone());

    run(&config, &source).unwrap();
    let first = fs::read(&config.output.path).unwrap();
    run(&config, &source).unwrap();
    let second = fs::read(&config.output.path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_offline_without_cache_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let mut config = TaxonomyConfig::default();
    config.source.cache_file = temp.path().join("missing.json");
    config.output.path = temp.path().join("OhdAB.ttl");

    let err = run(&config, &CachedSource::new(config.source.cache_file.clone())).unwrap_err();
    assert!(matches!(err, TaxonomyError::FileNotFound(_)));
    assert!(!config.output.path.exists());
}

#[test]
fn test_failed_build_keeps_previous_export() {
    let temp = TempDir::new().unwrap();
    let config = setup(temp.path());
    fs::write(&config.output.path, "previous export").unwrap();

    let broken = temp.path().join("broken.json");
    fs::write(
        &broken,
        r#"{"results": {"bindings": [{"OhdAB_Schluessel": {"type": "literal", "value": "kein IRI"}}]}}"#,
    )
    .unwrap();

    let err = run(&config, &CachedSource::new(&broken)).unwrap_err();
    assert!(matches!(err, TaxonomyError::InvalidIri { .. }));
    assert_eq!(fs::read_to_string(&config.output.path).unwrap(), "previous export");
}

#[test]
fn test_config_file_drives_build() {
    let temp = TempDir::new().unwrap();
    let config = setup(temp.path());

    let yaml = format!(
        "apiVersion: ohdab/v1\nkind: Taxonomy\nsource:\n  cacheFile: {}\noutput:\n  path: {}\n  mode: term\n",
        config.source.cache_file.display(),
        temp.path().join("terms.ttl").display()
    );
    let config_path = temp.path().join("ohdab.yaml");
    fs::write(&config_path, yaml).unwrap();

    let loaded = TaxonomyConfig::load(&config_path).unwrap();
    assert_eq!(loaded.output.mode, BuildMode::Term);

    let report = run(&loaded, &CachedSource::new(loaded.source.cache_file.clone())).unwrap();
    assert_eq!(report.output, temp.path().join("terms.ttl"));
    assert!(report.output.exists());
}
