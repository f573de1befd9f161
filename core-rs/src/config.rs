/**
 * config.rs
 * Parser for taxonomy build configuration (YAML format)
 *
 * Format:
 * ```yaml
 * apiVersion: ohdab/v1
 * kind: Taxonomy
 * source:
 *   endpoint: https://database.factgrid.de/sparql
 *   cacheFile: resources/fetchresult.json
 * output:
 *   path: OhdAB.ttl
 *   format: turtle
 *   mode: class
 * ```
 *
 * Every section is optional; missing sections fall back to the defaults below.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::TaxonomyError;
use crate::export::OutputFormat;
use crate::metadata::OntologyMetadata;
use crate::taxonomy::BuildMode;
use crate::vocab::Vocabulary;

pub const API_VERSION: &str = "ohdab/v1";
pub const KIND: &str = "Taxonomy";

/// Number of ancestor levels each row carries
pub const ANCESTOR_LEVELS: usize = 6;

pub const DEFAULT_ENDPOINT: &str = "https://database.factgrid.de/sparql";
pub const DEFAULT_CACHE_FILE: &str = "resources/fetchresult.json";
pub const DEFAULT_OUTPUT_FILE: &str = "OhdAB.ttl";

/// Query for the OhdAB vocabulary. Each ancestor level is joined off the
/// previous one, so a row never has a deeper level bound after a gap.
///
/// If the query changes, delete the cache file to get fresh results.
pub const DEFAULT_QUERY: &str = r#"
SELECT ?OhdAB_ID ?OhdAB_Schluessel ?OhdAB_SchluesselLabel ?Normansetzung ?Weiblich ?Maennlich ?OhdAB_01 ?OhdAB_01Label ?OhdAB_02 ?OhdAB_02Label ?OhdAB_03 ?OhdAB_03Label ?OhdAB_04 ?OhdAB_04Label ?OhdAB_05 ?OhdAB_05Label ?OhdAB_AB ?OhdAB_ABLabel ?AnforderungLabel WHERE {
  SERVICE wikibase:label { bd:serviceParam wikibase:language "de". }
  ?OhdAB_Schluessel wdt:P2 wd:Q647777.
  OPTIONAL { ?OhdAB_Schluessel wdt:P904 ?OhdAB_ID. }
  OPTIONAL {
    ?OhdAB_Schluessel wdt:P914 ?Normansetzung.
    FILTER((LANG(?Normansetzung)) = "de")
  }
  OPTIONAL { ?OhdAB_Schluessel wdt:P888 ?Weiblich. }
  OPTIONAL { ?OhdAB_Schluessel wdt:P889 ?Maennlich. }
  OPTIONAL { ?OhdAB_Schluessel wdt:P1007 ?OhdAB_01.
           ?OhdAB_01 wdt:P1007 ?OhdAB_02.
           ?OhdAB_02 wdt:P1007 ?OhdAB_03.
           ?OhdAB_03 wdt:P1007 ?OhdAB_04.
           ?OhdAB_04 wdt:P1007 ?OhdAB_05.
           ?OhdAB_05 wdt:P1007 ?OhdAB_AB.
           }
  OPTIONAL { ?OhdAB_Schluessel wdt:P911 ?Anforderung. }
}
ORDER BY (?OhdAB_ID)
"#;

/// Top-level build configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub ontology: OntologyMetadata,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

/// Where rows come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub cache_file: PathBuf,
    pub query: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            query: DEFAULT_QUERY.to_string(),
            user_agent: format!("ohdab-rs/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 120,
        }
    }
}

/// Result variable names for each logical row field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMap {
    pub key: String,
    pub key_label: String,
    pub external_id: String,
    pub normalized_form: String,
    pub feminine_form: String,
    pub masculine_form: String,
    /// Ancestor variables, nearest first
    pub ancestors: Vec<String>,
    /// Appended to an ancestor variable to find its label variable
    pub label_suffix: String,
    pub requirement_label: String,
}

impl FieldMap {
    /// Label variable for an ancestor variable (`OhdAB_01` → `OhdAB_01Label`)
    pub fn label_field(&self, ancestor: &str) -> String {
        format!("{}{}", ancestor, self.label_suffix)
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            key: "OhdAB_Schluessel".to_string(),
            key_label: "OhdAB_SchluesselLabel".to_string(),
            external_id: "OhdAB_ID".to_string(),
            normalized_form: "Normansetzung".to_string(),
            feminine_form: "Weiblich".to_string(),
            masculine_form: "Maennlich".to_string(),
            ancestors: ["OhdAB_01", "OhdAB_02", "OhdAB_03", "OhdAB_04", "OhdAB_05", "OhdAB_AB"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            label_suffix: "Label".to_string(),
            requirement_label: "AnforderungLabel".to_string(),
        }
    }
}

/// Namespace and label language of the emitted vocabulary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VocabularyConfig {
    pub namespace: String,
    pub prefix: String,
    pub language: String,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            namespace: "https://database.factgrid.de/".to_string(),
            prefix: "omw".to_string(),
            language: "de".to_string(),
        }
    }
}

/// What to write and how
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub mode: BuildMode,
    /// Attach `""@de` to ancestors whose label variable is unbound (class mode).
    /// Off by default; only for byte-compatibility with older exports.
    pub empty_ancestor_labels: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            format: OutputFormat::Turtle,
            mode: BuildMode::Class,
            empty_ancestor_labels: false,
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            source: SourceConfig::default(),
            fields: FieldMap::default(),
            vocabulary: VocabularyConfig::default(),
            ontology: OntologyMetadata::default(),
            output: OutputConfig::default(),
        }
    }
}

impl TaxonomyConfig {
    /// Load configuration from a YAML file
    ///
    /// # Example
    /// ```no_run
    /// use ohdab_core::TaxonomyConfig;
    ///
    /// let config = TaxonomyConfig::load("ohdab.yaml").unwrap();
    /// assert_eq!(config.kind, "Taxonomy");
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(TaxonomyError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TaxonomyError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: TaxonomyConfig = serde_yaml::from_str(&content).map_err(|e| {
            TaxonomyError::ParseError(format!("Invalid taxonomy config YAML: {}", e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise use the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, TaxonomyError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    ///
    /// Ensures:
    /// - apiVersion is "ohdab/v1" and kind is "Taxonomy"
    /// - an endpoint and a key variable are set
    /// - exactly six ancestor variables are listed
    /// - namespace, ontology IRIs and language tags parse
    pub fn validate(&self) -> Result<(), TaxonomyError> {
        if self.api_version != API_VERSION {
            return Err(TaxonomyError::ValidationError(format!(
                "Invalid apiVersion: expected '{}', got '{}'",
                API_VERSION, self.api_version
            )));
        }

        if self.kind != KIND {
            return Err(TaxonomyError::ValidationError(format!(
                "Invalid kind: expected '{}', got '{}'",
                KIND, self.kind
            )));
        }

        if self.source.endpoint.is_empty() {
            return Err(TaxonomyError::ValidationError(
                "source.endpoint cannot be empty".to_string(),
            ));
        }

        if self.fields.key.is_empty() {
            return Err(TaxonomyError::ValidationError(
                "fields.key cannot be empty".to_string(),
            ));
        }

        if self.fields.ancestors.len() != ANCESTOR_LEVELS {
            return Err(TaxonomyError::ValidationError(format!(
                "fields.ancestors must list {} variables, got {}",
                ANCESTOR_LEVELS,
                self.fields.ancestors.len()
            )));
        }

        Vocabulary::from_config(&self.vocabulary)?;
        self.ontology.validate()?;

        Ok(())
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TaxonomyError> {
        let yaml = serde_yaml::to_string(self).map_err(|e| {
            TaxonomyError::SerializationError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path.as_ref(), yaml).map_err(|e| {
            TaxonomyError::IoError(format!("Failed to write config: {}", e))
        })?;

        Ok(())
    }
}
