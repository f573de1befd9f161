/// Example: Inspect a built taxonomy with SPARQL
///
/// Builds the class hierarchy from cached SPARQL results, loads it into an
/// in-memory store and lists the top-level classes plus the ancestor chain
/// of one entity.
///
/// Usage:
///   cargo run --example inspect_taxonomy resources/fetchresult.json
///   cargo run --example inspect_taxonomy resources/fetchresult.json https://database.factgrid.de/entity/Q123

use ohdab_core::{build_graph, CachedSource, RowSource, TaxonomyConfig};
use oxigraph::model::GraphNameRef;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example inspect_taxonomy <results.json> [entity IRI]");
        std::process::exit(1);
    }

    let config = TaxonomyConfig::default();
    let results = CachedSource::new(&args[1]).fetch()?;
    let taxonomy = build_graph(&config, &results)?;

    println!("Built {} triples ({})", taxonomy.len(), taxonomy.stats);

    let store = Store::new()?;
    store.extend(taxonomy.graph.iter().map(|t| t.in_graph(GraphNameRef::DefaultGraph)))?;

    let roots = r#"
        PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

        SELECT ?class ?label
        WHERE {
            ?class a rdfs:Class .
            FILTER NOT EXISTS { ?class rdfs:subClassOf ?parent }
            OPTIONAL { ?class rdfs:label ?label }
        }
        ORDER BY ?label
    "#;

    println!("\nTOP-LEVEL CLASSES:");
    print_rows(&store, roots)?;

    if let Some(entity) = args.get(2) {
        let chain = format!(
            r#"
            PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

            SELECT ?ancestor ?label
            WHERE {{
                <{}> rdfs:subClassOf+ ?ancestor .
                OPTIONAL {{ ?ancestor rdfs:label ?label }}
            }}
            "#,
            entity
        );

        println!("\nANCESTORS OF {}:", entity);
        print_rows(&store, &chain)?;
    }

    Ok(())
}

fn print_rows(store: &Store, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let QueryResults::Solutions(solutions) = store.query(query)? {
        for (i, solution) in solutions.enumerate() {
            let solution = solution?;
            let cells: Vec<String> = solution
                .iter()
                .map(|(var, term)| format!("{}={}", var.as_str(), term))
                .collect();
            println!("   {}. {}", i + 1, cells.join("  "));
        }
    }
    Ok(())
}
