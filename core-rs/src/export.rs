//! Graph serialization
//!
//! Writes a graph with a stable triple order so the same rows always give
//! the same bytes. Files are written next to the target and renamed into
//! place, so a failed run never leaves a half-written export behind.

use clap::ValueEnum;
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::vocab::rdf;
use oxigraph::model::{Graph, Triple};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{Result, TaxonomyError};

/// Supported output syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Turtle,
    #[value(name = "ntriples")]
    NTriples,
    #[value(name = "rdfxml")]
    RdfXml,
}

impl OutputFormat {
    pub fn rdf_format(self) -> RdfFormat {
        match self {
            OutputFormat::Turtle => RdfFormat::Turtle,
            OutputFormat::NTriples => RdfFormat::NTriples,
            OutputFormat::RdfXml => RdfFormat::RdfXml,
        }
    }

    pub fn extension(self) -> &'static str {
        self.rdf_format().file_extension()
    }

    /// Guess from a file extension (`ttl`, `nt`, `rdf`, `owl`)
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ttl" => Some(OutputFormat::Turtle),
            "nt" => Some(OutputFormat::NTriples),
            "rdf" | "owl" | "xml" => Some(OutputFormat::RdfXml),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rdf_format().name())
    }
}

/// Triples of `graph` in output order: by subject, `rdf:type` first, then
/// by predicate and object
pub fn sorted_triples(graph: &Graph) -> Vec<Triple> {
    let mut triples: Vec<Triple> = graph.iter().map(|t| t.into_owned()).collect();
    triples.sort_by_cached_key(|t| {
        (
            t.subject.to_string(),
            t.predicate != rdf::TYPE,
            t.predicate.to_string(),
            t.object.to_string(),
        )
    });
    triples
}

/// Serialize `graph` into `writer`
///
/// Prefixes are only used by syntaxes that support them.
pub fn serialize_graph<W: Write>(
    graph: &Graph,
    format: OutputFormat,
    prefixes: &[(String, String)],
    writer: W,
) -> Result<W> {
    let mut serializer = RdfSerializer::from_format(format.rdf_format());
    if format != OutputFormat::NTriples {
        for (name, iri) in prefixes {
            serializer = serializer.with_prefix(name.as_str(), iri.as_str()).map_err(|e| {
                TaxonomyError::SerializationError(format!("Invalid prefix {}: <{}>: {}", name, iri, e))
            })?;
        }
    }

    let mut writer = serializer.for_writer(writer);
    for triple in sorted_triples(graph) {
        writer.serialize_triple(&triple)?;
    }
    Ok(writer.finish()?)
}

/// Serialize into a string
pub fn to_string(graph: &Graph, format: OutputFormat, prefixes: &[(String, String)]) -> Result<String> {
    let bytes = serialize_graph(graph, format, prefixes, Vec::new())?;
    String::from_utf8(bytes).map_err(|e| TaxonomyError::SerializationError(e.to_string()))
}

/// Write `graph` to `path`, replacing any previous file only on success
pub fn write_graph_file(
    graph: &Graph,
    format: OutputFormat,
    prefixes: &[(String, String)],
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging = staging_path(path);
    let result = fs::File::create(&staging)
        .map_err(TaxonomyError::from)
        .and_then(|file| serialize_graph(graph, format, prefixes, std::io::BufWriter::new(file)))
        .and_then(|mut writer| writer.flush().map_err(TaxonomyError::from));

    if let Err(e) = result {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    fs::rename(&staging, path).map_err(|e| {
        TaxonomyError::IoError(format!("Failed to move export into {}: {}", path.display(), e))
    })?;

    info!(path = %path.display(), triples = graph.len(), format = %format, "RDF exported");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
