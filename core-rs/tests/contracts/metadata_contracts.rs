// Ontology Metadata Contract Tests
//
// The ontology resource carries a fixed bundle of descriptive triples.
// Annotation must be idempotent and must not depend on row data.

use ohdab_core::{
    build_graph, Binding, OntologyMetadata, QueryResults, Record, TaxonomyConfig, Vocabulary,
};
use oxigraph::model::vocab::rdf;
use oxigraph::model::{Graph, TermRef, TripleRef};

/// WHY: Annotating twice produces the same triple count as annotating once
/// REASON: Set semantics; re-runs must not inflate the export
#[test]
fn annotate_twice_adds_nothing() {
    let metadata = OntologyMetadata::default();
    let vocab = Vocabulary::default();
    let mut graph = Graph::new();

    let first = metadata.annotate(&mut graph, &vocab).unwrap();
    let len = graph.len();
    let second = metadata.annotate(&mut graph, &vocab).unwrap();

    assert!(first > 0);
    assert_eq!(second, 0);
    assert_eq!(graph.len(), len);
}

/// WHY: Metadata triples are the same whatever rows were built
/// REASON: Ontology description is static configuration, not derived from data
#[test]
fn metadata_independent_of_rows() {
    let config = TaxonomyConfig::default();
    let empty = build_graph(&config, &QueryResults::default()).unwrap();

    let row = Record::new()
        .with("OhdAB_Schluessel", Binding::uri("https://database.factgrid.de/entity/Q1"));
    let one = build_graph(&config, &QueryResults::from_records(vec![], vec![row])).unwrap();

    assert_eq!(empty.metadata_triples, one.metadata_triples);
    assert_eq!(empty.len(), empty.metadata_triples);
}

/// WHY: The ontology resource is typed and versioned
#[test]
fn ontology_resource_declared() {
    let metadata = OntologyMetadata::default();
    let vocab = Vocabulary::default();
    let mut graph = Graph::new();
    metadata.annotate(&mut graph, &vocab).unwrap();

    let ontology = metadata.node().unwrap();
    assert!(graph.contains(TripleRef::new(ontology.as_ref(), rdf::TYPE, vocab.ontology.as_ref())));

    let license = graph
        .triples_for_subject(ontology.as_ref())
        .find(|t| t.predicate.as_str() == "http://purl.org/dc/terms/license")
        .map(|t| t.object);
    match license {
        Some(TermRef::NamedNode(n)) => {
            assert_eq!(n.as_str(), "https://creativecommons.org/licenses/by/4.0/")
        }
        other => panic!("license must be an IRI, got {:?}", other),
    }
}

/// WHY: Custom metadata from configuration is honoured
#[test]
fn configured_metadata_used() {
    let mut config = TaxonomyConfig::default();
    config.ontology.iri = "https://example.org/ohdab".to_string();
    config.ontology.revision = "2.1.0".to_string();

    let taxonomy = build_graph(&config, &QueryResults::default()).unwrap();
    let text = taxonomy.serialize(ohdab_core::OutputFormat::NTriples).unwrap();

    assert!(text.contains("<https://example.org/ohdab> <http://www.w3.org/2002/07/owl#versionIRI> <https://example.org/ohdab/2.1.0>"));
}
