//! End-to-end batch pass
//!
//! fetch rows → build taxonomy → attach ontology metadata → write export.
//! Any error aborts the pass before the output file is touched.

use oxigraph::model::Graph;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::TaxonomyConfig;
use crate::errors::Result;
use crate::export::{self, OutputFormat};
use crate::source::{QueryResults, RowSource};
use crate::taxonomy::{BuildMode, BuildStats, TaxonomyBuilder};
use crate::vocab::Vocabulary;

/// A built graph together with what went into it
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub graph: Graph,
    pub vocabulary: Vocabulary,
    pub stats: BuildStats,
    pub metadata_triples: usize,
}

impl Taxonomy {
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn serialize(&self, format: OutputFormat) -> Result<String> {
        export::to_string(&self.graph, format, &self.vocabulary.prefixes())
    }

    pub fn write(&self, path: &Path, format: OutputFormat) -> Result<()> {
        export::write_graph_file(&self.graph, format, &self.vocabulary.prefixes(), path)
    }
}

/// Summary of one `run`
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub source: String,
    pub mode: BuildMode,
    pub format: OutputFormat,
    pub output: PathBuf,
    pub stats: BuildStats,
    pub metadata_triples: usize,
    pub triples: usize,
}

/// Build the taxonomy and metadata for already-fetched results
pub fn build_graph(config: &TaxonomyConfig, results: &QueryResults) -> Result<Taxonomy> {
    let vocabulary = Vocabulary::from_config(&config.vocabulary)?;
    let builder = TaxonomyBuilder::new(config.output.mode, vocabulary.clone())
        .with_empty_ancestor_labels(config.output.empty_ancestor_labels);

    let mut graph = Graph::new();
    let stats = builder.build_records(&mut graph, results.records(), &config.fields)?;
    let metadata_triples = config.ontology.annotate(&mut graph, &vocabulary)?;

    Ok(Taxonomy {
        graph,
        vocabulary,
        stats,
        metadata_triples,
    })
}

/// Fetch from `source`, build, and write to `config.output.path`
pub fn run<S: RowSource + ?Sized>(config: &TaxonomyConfig, source: &S) -> Result<BuildReport> {
    info!(source = %source.describe(), mode = %config.output.mode, "Starting taxonomy build");

    let results = source.fetch()?;
    let taxonomy = build_graph(config, &results)?;
    taxonomy.write(&config.output.path, config.output.format)?;

    Ok(BuildReport {
        source: source.describe(),
        mode: config.output.mode,
        format: config.output.format,
        output: config.output.path.clone(),
        stats: taxonomy.stats,
        metadata_triples: taxonomy.metadata_triples,
        triples: taxonomy.len(),
    })
}
