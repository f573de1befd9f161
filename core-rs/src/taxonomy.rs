//! Taxonomy construction
//!
//! Turns result rows into a hierarchy of nodes joined by `broader` (term
//! mode) or `rdfs:subClassOf` (class mode) edges. Each row names a key and
//! up to six ancestors, nearest first. The walk for a row starts at the
//! key and follows the ancestors in order, linking each node to the next,
//! and stops at the first unbound ancestor.
//!
//! Nodes are identified by IRI. Type and edge triples are plain set inserts,
//! so rows that share ancestors never duplicate them. Labels are
//! single-valued: a later row overwrites an earlier label for the same node.

use clap::ValueEnum;
use oxigraph::model::vocab::{rdf, rdfs};
use oxigraph::model::{Graph, Literal, NamedNode, NamedNodeRef, Term, TermRef, TripleRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::FieldMap;
use crate::errors::{Result, TaxonomyError};
use crate::source::Record;
use crate::vocab::{named_node, Vocabulary};

/// Which node/edge shape the builder emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// `omw:Term` nodes with preferred/alternate labels, linked by `omw:broader`
    Term,
    /// `rdfs:Class` nodes with `rdfs:label`, linked by `rdfs:subClassOf`
    #[default]
    Class,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Term => write!(f, "term"),
            BuildMode::Class => write!(f, "class"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    pub iri: String,
    pub label: Option<String>,
}

/// Typed view of one result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyRow {
    pub key: String,
    pub key_label: Option<String>,
    pub external_id: Option<String>,
    pub normalized_form: Option<String>,
    pub feminine_form: Option<String>,
    pub masculine_form: Option<String>,
    /// One slot per ancestor level, nearest first
    pub ancestors: Vec<Option<Ancestor>>,
    pub requirement_label: Option<String>,
}

impl TaxonomyRow {
    /// Extract a row using the configured variable names
    ///
    /// `index` is only used to report a missing key.
    pub fn from_record(index: usize, record: &Record, fields: &FieldMap) -> Result<Self> {
        let text = |field: &str| record.value(field).map(str::to_string);

        let key = text(&fields.key).ok_or_else(|| TaxonomyError::MissingField {
            row: index,
            field: fields.key.clone(),
        })?;

        let ancestors = fields
            .ancestors
            .iter()
            .map(|field| {
                record.value(field).map(|iri| Ancestor {
                    iri: iri.to_string(),
                    label: text(&fields.label_field(field)),
                })
            })
            .collect();

        Ok(Self {
            key,
            key_label: text(&fields.key_label),
            external_id: text(&fields.external_id),
            normalized_form: text(&fields.normalized_form),
            feminine_form: text(&fields.feminine_form),
            masculine_form: text(&fields.masculine_form),
            ancestors,
            requirement_label: text(&fields.requirement_label),
        })
    }

    /// Ancestors reachable from the key, stopping at the first gap
    pub fn chain(&self) -> impl Iterator<Item = &Ancestor> {
        self.ancestors.iter().map_while(Option::as_ref)
    }

    /// Level (1-based) of the first gap after which a deeper ancestor is still bound
    pub fn truncated_at(&self) -> Option<usize> {
        let gap = self.ancestors.iter().position(Option::is_none)?;
        self.ancestors[gap..]
            .iter()
            .any(Option::is_some)
            .then_some(gap + 1)
    }
}

/// Convert every record, failing on the first one without a key
pub fn rows_from_records(records: &[Record], fields: &FieldMap) -> Result<Vec<TaxonomyRow>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| TaxonomyRow::from_record(index, record, fields))
        .collect()
}

/// Counters for one build pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub records: usize,
    /// Distinct nodes that received a type declaration
    pub nodes: usize,
    /// Distinct hierarchy edges
    pub edges: usize,
    /// Label assignments, including ones that rewrote the same text
    pub labels: usize,
    /// Labels replaced by different text from a later row
    pub label_overwrites: usize,
    /// Rows with a bound ancestor after a gap (ignored)
    pub truncated_chains: usize,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} nodes, {} edges, {} labels ({} overwritten), {} truncated chains",
            self.records, self.nodes, self.edges, self.labels, self.label_overwrites, self.truncated_chains
        )
    }
}

/// Builds the taxonomy into a graph
#[derive(Debug, Clone)]
pub struct TaxonomyBuilder {
    mode: BuildMode,
    vocabulary: Vocabulary,
    empty_ancestor_labels: bool,
}

impl TaxonomyBuilder {
    pub fn new(mode: BuildMode, vocabulary: Vocabulary) -> Self {
        Self {
            mode,
            vocabulary,
            empty_ancestor_labels: false,
        }
    }

    /// In class mode, give unlabelled ancestors an empty label
    ///
    /// The empty label is only written when the node has no label yet, and
    /// any real label written later replaces it.
    pub fn with_empty_ancestor_labels(mut self, enabled: bool) -> Self {
        self.empty_ancestor_labels = enabled;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Convert `records` and add them to `graph`
    pub fn build_records(
        &self,
        graph: &mut Graph,
        records: &[Record],
        fields: &FieldMap,
    ) -> Result<BuildStats> {
        let rows = rows_from_records(records, fields)?;
        self.build(graph, &rows)
    }

    /// Add every row to `graph`, in order
    pub fn build(&self, graph: &mut Graph, rows: &[TaxonomyRow]) -> Result<BuildStats> {
        let mut stats = BuildStats::default();

        for row in rows {
            self.add_row(graph, row, &mut stats)?;
            stats.records += 1;
        }

        if stats.truncated_chains > 0 {
            warn!(
                rows = stats.truncated_chains,
                "Ancestor chains with gaps were truncated at the first gap"
            );
        }

        info!(mode = %self.mode, %stats, "Taxonomy built");
        Ok(stats)
    }

    fn add_row(&self, graph: &mut Graph, row: &TaxonomyRow, stats: &mut BuildStats) -> Result<()> {
        let key = named_node(&row.key)?;
        self.declare(graph, &key, stats);

        match self.mode {
            BuildMode::Term => {
                if let Some(form) = &row.normalized_form {
                    let label = self.vocabulary.label(form)?;
                    set_label(graph, &key, self.vocabulary.preferred_label.as_ref(), label, stats);
                }
                if let Some(id) = &row.external_id {
                    let label = self.vocabulary.label(id)?;
                    set_label(graph, &key, self.vocabulary.alt_label.as_ref(), label, stats);
                }
            }
            BuildMode::Class => {
                if let Some(text) = &row.key_label {
                    let label = self.vocabulary.label(text)?;
                    set_label(graph, &key, rdfs::LABEL, label, stats);
                }
            }
        }

        let mut current = key;
        for ancestor in row.chain() {
            let node = named_node(&ancestor.iri)?;

            if graph.insert(TripleRef::new(current.as_ref(), self.edge_predicate(), node.as_ref())) {
                stats.edges += 1;
            }
            self.declare(graph, &node, stats);

            if self.mode == BuildMode::Class {
                match &ancestor.label {
                    Some(text) => {
                        let label = self.vocabulary.label(text)?;
                        set_label(graph, &node, rdfs::LABEL, label, stats);
                    }
                    None if self.empty_ancestor_labels => {
                        if graph.object_for_subject_predicate(node.as_ref(), rdfs::LABEL).is_none() {
                            graph.insert(TripleRef::new(node.as_ref(), rdfs::LABEL, self.vocabulary.label("")?.as_ref()));
                        }
                    }
                    None => {}
                }
            }

            current = node;
        }

        if let Some(level) = row.truncated_at() {
            debug!(key = %row.key, level, "Ancestor chain has a gap; deeper levels ignored");
            stats.truncated_chains += 1;
        }

        Ok(())
    }

    fn node_type(&self) -> NamedNodeRef<'_> {
        match self.mode {
            BuildMode::Term => self.vocabulary.term.as_ref(),
            BuildMode::Class => rdfs::CLASS,
        }
    }

    fn edge_predicate(&self) -> NamedNodeRef<'_> {
        match self.mode {
            BuildMode::Term => self.vocabulary.broader.as_ref(),
            BuildMode::Class => rdfs::SUB_CLASS_OF,
        }
    }

    fn declare(&self, graph: &mut Graph, node: &NamedNode, stats: &mut BuildStats) {
        if graph.insert(TripleRef::new(node.as_ref(), rdf::TYPE, self.node_type())) {
            stats.nodes += 1;
        }
    }
}

/// Replace whatever `predicate` currently holds on `node` with `label`
fn set_label(
    graph: &mut Graph,
    node: &NamedNode,
    predicate: NamedNodeRef<'_>,
    label: Literal,
    stats: &mut BuildStats,
) {
    stats.labels += 1;

    let existing: Vec<Term> = graph
        .objects_for_subject_predicate(node.as_ref(), predicate)
        .map(TermRef::into_owned)
        .collect();

    let label = Term::from(label);
    if existing.len() == 1 && existing[0] == label {
        return;
    }

    for old in &existing {
        graph.remove(TripleRef::new(node.as_ref(), predicate, old.as_ref()));
    }

    let replaced_text = existing.iter().any(|old| match old {
        Term::Literal(lit) => !lit.value().is_empty(),
        _ => true,
    });
    if replaced_text {
        debug!(node = %node, predicate = %predicate, new = %label, "Label overwritten by later row");
        stats.label_overwrites += 1;
    }

    graph.insert(TripleRef::new(node.as_ref(), predicate, label.as_ref()));
}
