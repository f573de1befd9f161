/**
 * vocab.rs
 * IRIs emitted by the taxonomy builder and the metadata annotator
 */

use oxigraph::model::{Literal, NamedNode, NamedNodeRef};

use crate::config::VocabularyConfig;
use crate::errors::{Result, TaxonomyError};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// owl:versionIRI
pub const OWL_VERSION_IRI: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#versionIRI");

/// Dublin Core terms used for ontology metadata
pub mod dcterms {
    use oxigraph::model::NamedNodeRef;

    pub const CREATOR: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/creator");
    pub const PUBLISHER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/publisher");
    pub const LICENSE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/license");
    pub const DESCRIPTION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/description");
}

/// Parse an identifier into a graph node, reporting the offending text on failure
pub fn named_node(iri: &str) -> Result<NamedNode> {
    NamedNode::new(iri).map_err(|e| TaxonomyError::InvalidIri {
        iri: iri.to_string(),
        reason: e.to_string(),
    })
}

/// Build a language-tagged literal
pub fn language_literal(text: &str, language: &str) -> Result<Literal> {
    Literal::new_language_tagged_literal(text, language).map_err(|e| {
        TaxonomyError::InvalidLanguageTag {
            tag: language.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Vocabulary namespace terms, resolved once per run
///
/// Every term is `namespace + local name`, so the namespace should end
/// with `/` or `#`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    pub namespace: String,
    pub prefix: String,
    pub language: String,
    pub term: NamedNode,
    pub preferred_label: NamedNode,
    pub alt_label: NamedNode,
    pub broader: NamedNode,
    pub ontology: NamedNode,
    pub ontology_title: NamedNode,
    pub revision: NamedNode,
    pub release_date: NamedNode,
}

impl Vocabulary {
    pub fn new(namespace: &str, prefix: &str, language: &str) -> Result<Self> {
        let term = |local: &str| named_node(&format!("{}{}", namespace, local));

        // Reject bad tags up front instead of on the first labelled row
        language_literal("", language)?;

        Ok(Self {
            namespace: namespace.to_string(),
            prefix: prefix.to_string(),
            language: language.to_string(),
            term: term("Term")?,
            preferred_label: term("preferredLabel")?,
            alt_label: term("altLabel")?,
            broader: term("broader")?,
            ontology: term("Ontology")?,
            ontology_title: term("ontologyTitle")?,
            revision: term("revision")?,
            release_date: term("releaseDate")?,
        })
    }

    pub fn from_config(config: &VocabularyConfig) -> Result<Self> {
        Self::new(&config.namespace, &config.prefix, &config.language)
    }

    /// Literal in the vocabulary's label language
    pub fn label(&self, text: &str) -> Result<Literal> {
        language_literal(text, &self.language)
    }

    /// Prefix bindings for serializers that support them (Turtle, RDF/XML)
    pub fn prefixes(&self) -> Vec<(String, String)> {
        vec![
            (self.prefix.clone(), self.namespace.clone()),
            ("rdf".to_string(), RDF_NS.to_string()),
            ("rdfs".to_string(), RDFS_NS.to_string()),
            ("owl".to_string(), OWL_NS.to_string()),
            ("dcterms".to_string(), DCTERMS_NS.to_string()),
            ("xsd".to_string(), XSD_NS.to_string()),
        ]
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        let config = VocabularyConfig::default();
        Self {
            term: NamedNode::new_unchecked(format!("{}Term", config.namespace)),
            preferred_label: NamedNode::new_unchecked(format!("{}preferredLabel", config.namespace)),
            alt_label: NamedNode::new_unchecked(format!("{}altLabel", config.namespace)),
            broader: NamedNode::new_unchecked(format!("{}broader", config.namespace)),
            ontology: NamedNode::new_unchecked(format!("{}Ontology", config.namespace)),
            ontology_title: NamedNode::new_unchecked(format!("{}ontologyTitle", config.namespace)),
            revision: NamedNode::new_unchecked(format!("{}revision", config.namespace)),
            release_date: NamedNode::new_unchecked(format!("{}releaseDate", config.namespace)),
            namespace: config.namespace,
            prefix: config.prefix,
            language: config.language,
        }
    }
}
