//! # OhdAB Core - Occupational Taxonomy Builder
//!
//! Builds the OhdAB vocabulary (Ontologie der historischen, deutschsprachigen
//! Amts- und Berufsbezeichnungen) from FactGrid SPARQL results and exports it
//! as RDF.
//!
//! ## Core Principle
//!
//! **One pass, one graph**: rows are fetched (or replayed from a cache), walked
//! once into an in-memory graph, annotated with ontology metadata and written.
//! Graph set semantics absorb duplicate declarations; labels are last-write-wins.
//!
//! ## Build Modes
//!
//! - `term`: `omw:Term` nodes linked by `omw:broader`
//! - `class`: `rdfs:Class` nodes linked by `rdfs:subClassOf`
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────────┐
//! │  RowSource   │──▶│ TaxonomyBuilder│──▶│ OntologyMetadata │
//! │ endpoint or  │   │  term | class  │   │    annotate      │
//! │    cache     │   └────────────────┘   └────────┬─────────┘
//! └──────────────┘                                 ▼
//!                                        ┌──────────────────┐
//!                                        │ export (Turtle,  │
//!                                        │ N-Triples, XML)  │
//!                                        └──────────────────┘
//! ```

pub mod config;
pub mod errors;
pub mod export;
pub mod metadata;
pub mod pipeline;
pub mod source;
pub mod taxonomy;
pub mod vocab;

pub use config::{FieldMap, OutputConfig, SourceConfig, TaxonomyConfig, VocabularyConfig};
pub use errors::{Result, TaxonomyError};
pub use export::OutputFormat;
pub use metadata::{LocalizedText, OntologyMetadata};
pub use pipeline::{build_graph, run, BuildReport, Taxonomy};
pub use source::{Binding, CachedSource, CachingSource, EndpointSource, QueryResults, Record, RowSource};
pub use taxonomy::{Ancestor, BuildMode, BuildStats, TaxonomyBuilder, TaxonomyRow};
pub use vocab::Vocabulary;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
