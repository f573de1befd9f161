/**
 * metadata.rs
 * Ontology-level descriptive triples (title, creator, license, version, ...)
 */

use chrono::NaiveDate;
use oxigraph::model::vocab::{rdf, xsd};
use oxigraph::model::{Graph, Literal, NamedNode, NamedNodeRef, TermRef, TripleRef};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::vocab::{dcterms, language_literal, named_node, Vocabulary, OWL_VERSION_IRI};

/// Text in one language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalizedText {
    pub lang: String,
    pub text: String,
}

impl LocalizedText {
    pub fn new(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            text: text.into(),
        }
    }
}

/// Descriptive metadata attached to the ontology resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OntologyMetadata {
    pub iri: String,
    /// Defaults to `<iri>/<revision>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_iri: Option<String>,
    pub titles: Vec<LocalizedText>,
    pub creator: String,
    pub publisher: String,
    pub license: String,
    pub revision: String,
    pub release_date: NaiveDate,
    pub descriptions: Vec<LocalizedText>,
}

impl Default for OntologyMetadata {
    fn default() -> Self {
        Self {
            iri: "https://database.factgrid.de/ohdab".to_string(),
            version_iri: None,
            titles: vec![
                LocalizedText::new(
                    "de",
                    "Ontologie der historischen, deutschsprachigen Amts- und Berufsbezeichnungen | OhdAB",
                ),
                LocalizedText::new(
                    "en",
                    "Ontology of the historical German-language nomenclature for offices and professions | OhdAB",
                ),
            ],
            creator: "Katrin Moeller".to_string(),
            publisher: "Olaf Simons".to_string(),
            license: "https://creativecommons.org/licenses/by/4.0/".to_string(),
            revision: "1.0.0".to_string(),
            release_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            descriptions: vec![
                LocalizedText::new(
                    "de",
                    "Diese Version der Ontologie der historischen, deutschsprachigen Amts- und Berufsbezeichnungen (OhdAB) wurde über ein Skript automatisch aus FactGrid generiert.",
                ),
                LocalizedText::new(
                    "en",
                    "This version of the historical German-language nomenclature for offices and professions (OhdAB) was automatically generated via a script from FactGrid.",
                ),
            ],
        }
    }
}

impl OntologyMetadata {
    pub fn version_iri(&self) -> String {
        self.version_iri
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.iri, self.revision))
    }

    /// Check that every IRI and language tag is usable
    pub fn validate(&self) -> Result<()> {
        named_node(&self.iri)?;
        named_node(&self.version_iri())?;
        named_node(&self.license)?;
        for text in self.titles.iter().chain(&self.descriptions) {
            language_literal(&text.text, &text.lang)?;
        }
        Ok(())
    }

    /// Add the metadata triples to `graph`
    ///
    /// Returns how many triples were new; calling this twice adds nothing
    /// the second time.
    pub fn annotate(&self, graph: &mut Graph, vocabulary: &Vocabulary) -> Result<usize> {
        let ontology = named_node(&self.iri)?;
        let version = named_node(&self.version_iri())?;
        let license = named_node(&self.license)?;

        let mut added = 0;
        let mut add = |predicate: NamedNodeRef<'_>, object: TermRef<'_>| {
            if graph.insert(TripleRef::new(ontology.as_ref(), predicate, object)) {
                added += 1;
            }
        };

        add(rdf::TYPE, vocabulary.ontology.as_ref().into());
        add(OWL_VERSION_IRI, version.as_ref().into());

        for title in &self.titles {
            let literal = language_literal(&title.text, &title.lang)?;
            add(vocabulary.ontology_title.as_ref(), literal.as_ref().into());
        }

        if !self.creator.is_empty() {
            add(dcterms::CREATOR, Literal::new_simple_literal(&self.creator).as_ref().into());
        }
        if !self.publisher.is_empty() {
            add(dcterms::PUBLISHER, Literal::new_simple_literal(&self.publisher).as_ref().into());
        }

        add(dcterms::LICENSE, license.as_ref().into());
        add(
            vocabulary.revision.as_ref(),
            Literal::new_typed_literal(&self.revision, xsd::STRING).as_ref().into(),
        );
        add(
            vocabulary.release_date.as_ref(),
            Literal::new_typed_literal(self.release_date.format("%Y-%m-%d").to_string(), xsd::DATE)
                .as_ref()
                .into(),
        );

        for description in &self.descriptions {
            let literal = language_literal(&description.text, &description.lang)?;
            add(dcterms::DESCRIPTION, literal.as_ref().into());
        }

        debug!(ontology = %self.iri, added, "Ontology metadata attached");
        Ok(added)
    }

    /// The ontology resource as a graph node
    pub fn node(&self) -> Result<NamedNode> {
        named_node(&self.iri)
    }
}
