//! Integration tests for row sources
//!
//! Tests fetching against a loopback SPARQL endpoint stub:
//! - Request shape (query parameter, Accept header, User-Agent)
//! - Caching on first fetch, replay afterwards
//! - HTTP error statuses

use ohdab_core::{CachingSource, EndpointSource, QueryResults, RowSource, TaxonomyError};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use tempfile::TempDir;

const BODY: &str = r#"{
  "head": { "vars": ["OhdAB_Schluessel", "Normansetzung"] },
  "results": { "bindings": [
    {
      "OhdAB_Schluessel": { "type": "uri", "value": "https://database.factgrid.de/entity/Q100" },
      "Normansetzung": { "xml:lang": "de", "type": "literal", "value": "Stadtschreiber" }
    },
    {
      "OhdAB_Schluessel": { "type": "uri", "value": "https://database.factgrid.de/entity/Q101" }
    }
  ] }
}"#;

/// Serve `connections` requests with a canned response, sending each request head back
fn serve(status: &str, body: &'static str, connections: usize) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/sparql", listener.local_addr().unwrap());
    let status = status.to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming().take(connections) {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            let _ = tx.send(head);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/sparql-results+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    (endpoint, rx)
}

#[test]
fn test_endpoint_fetch_parses_results() {
    let (endpoint, requests) = serve("200 OK", BODY, 1);

    let source = EndpointSource::new(endpoint, "SELECT * WHERE { ?s ?p ?o }")
        .with_user_agent("ohdab-tests/1.0");
    let results = source.fetch().unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(
        results.records()[0].value("Normansetzung"),
        Some("Stadtschreiber")
    );
    assert_eq!(results.records()[1].value("Normansetzung"), None);

    let head = requests.recv().unwrap();
    let request_line = head.lines().next().unwrap();
    assert!(request_line.starts_with("GET /sparql?query="));
    let lower = head.to_ascii_lowercase();
    assert!(lower.contains("accept: application/sparql-results+json"));
    assert!(lower.contains("user-agent: ohdab-tests/1.0"));
}

#[test]
fn test_endpoint_error_status() {
    let (endpoint, _requests) = serve("500 Internal Server Error", "{}", 1);

    let err = EndpointSource::new(endpoint, "SELECT * WHERE { ?s ?p ?o }")
        .fetch()
        .unwrap_err();

    assert!(matches!(err, TaxonomyError::Http(_)));
}

#[test]
fn test_endpoint_unparseable_body() {
    let (endpoint, _requests) = serve("200 OK", "<html>maintenance</html>", 1);

    let err = EndpointSource::new(endpoint, "SELECT * WHERE { ?s ?p ?o }")
        .fetch()
        .unwrap_err();

    assert!(matches!(err, TaxonomyError::Json(_)));
}

#[test]
fn test_caching_source_saves_then_replays() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("resources").join("fetchresult.json");
    // Only one connection is served; a second network fetch would fail
    let (endpoint, requests) = serve("200 OK", BODY, 1);

    let source = CachingSource::new(
        EndpointSource::new(endpoint, "SELECT * WHERE { ?s ?p ?o }"),
        &cache,
    );

    let fetched = source.fetch().unwrap();
    assert!(cache.exists());
    requests.recv().unwrap();

    let replayed = source.fetch().unwrap();
    assert_eq!(fetched, replayed);
    assert!(requests.try_recv().is_err());

    assert_eq!(QueryResults::load(&cache).unwrap(), fetched);
}

#[test]
fn test_failed_fetch_leaves_no_cache() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("fetchresult.json");
    let (endpoint, _requests) = serve("503 Service Unavailable", "{}", 1);

    let source = CachingSource::new(
        EndpointSource::new(endpoint, "SELECT * WHERE { ?s ?p ?o }"),
        &cache,
    );

    assert!(source.fetch().is_err());
    assert!(!cache.exists());
}
