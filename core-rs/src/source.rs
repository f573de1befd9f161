//! Row sources for the taxonomy build
//!
//! A row source produces a SPARQL 1.1 JSON results document. Three sources
//! are provided:
//! - `EndpointSource`: runs the configured query against the SPARQL endpoint
//! - `CachedSource`: replays a results document saved on disk
//! - `CachingSource`: replays the cache when present, otherwise fetches
//!   from an inner source and saves what it got
//!
//! The builder only ever sees `QueryResults`, never which source produced it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::errors::{Result, TaxonomyError};

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// One bound value in a result row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Binding {
    /// `uri`, `literal`, `typed-literal` or `bnode`
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl Binding {
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            lang: Some(lang.into()),
            ..Self::literal(value)
        }
    }
}

/// One result row: variable name → binding. Unbound variables are absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Binding>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `field`, replacing any previous binding
    pub fn insert(&mut self, field: impl Into<String>, binding: Binding) {
        self.0.insert(field.into(), binding);
    }

    /// Builder-style `insert`
    pub fn with(mut self, field: impl Into<String>, binding: Binding) -> Self {
        self.insert(field, binding);
        self
    }

    /// Lexical value of `field`, or `None` when the variable is unbound
    pub fn value(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|b| b.value.as_str())
    }

    pub fn binding(&self, field: &str) -> Option<&Binding> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultsHead {
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultBindings {
    #[serde(default)]
    pub bindings: Vec<Record>,
}

/// SPARQL 1.1 query results, JSON serialization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResults {
    #[serde(default)]
    pub head: ResultsHead,
    pub results: ResultBindings,
}

impl QueryResults {
    pub fn from_records(vars: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            head: ResultsHead { vars, link: Vec::new() },
            results: ResultBindings { bindings: records },
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.results.bindings
    }

    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a results document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TaxonomyError::FileNotFound(path.display().to_string()));
        }
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| {
            TaxonomyError::ParseError(format!(
                "Invalid SPARQL results in {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            TaxonomyError::IoError(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

/// Anything that can produce the rows of one build
pub trait RowSource {
    fn fetch(&self) -> Result<QueryResults>;

    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// Live SPARQL endpoint
#[derive(Debug, Clone)]
pub struct EndpointSource {
    endpoint: String,
    query: String,
    user_agent: String,
    timeout: Duration,
}

impl EndpointSource {
    pub fn new(endpoint: impl Into<String>, query: impl Into<String>) -> Self {
        let defaults = SourceConfig::default();
        Self {
            endpoint: endpoint.into(),
            query: query.into(),
            user_agent: defaults.user_agent,
            timeout: Duration::from_secs(defaults.timeout_secs),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.endpoint.clone(), config.query.clone())
            .with_user_agent(config.user_agent.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RowSource for EndpointSource {
    fn fetch(&self) -> Result<QueryResults> {
        info!(endpoint = %self.endpoint, "Fetching SPARQL results");

        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&self.endpoint)
            .query(&[("query", self.query.as_str())])
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_JSON)
            .send()?
            .error_for_status()?;

        let body = response.text()?;
        let results = QueryResults::from_json_str(&body)?;

        info!(rows = results.len(), "Fetched SPARQL results");
        Ok(results)
    }

    fn describe(&self) -> String {
        format!("SPARQL endpoint {}", self.endpoint)
    }
}

/// Previously saved results document
#[derive(Debug, Clone)]
pub struct CachedSource {
    path: PathBuf,
}

impl CachedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl RowSource for CachedSource {
    fn fetch(&self) -> Result<QueryResults> {
        info!(cache = %self.path.display(), "Loading cached SPARQL results");
        let results = QueryResults::load(&self.path)?;
        debug!(rows = results.len(), "Cache replayed");
        Ok(results)
    }

    fn describe(&self) -> String {
        format!("cache {}", self.path.display())
    }
}

/// Replay the cache when it exists, otherwise fetch from `inner` and save
#[derive(Debug, Clone)]
pub struct CachingSource<S> {
    inner: S,
    cache: CachedSource,
    refresh: bool,
}

impl<S: RowSource> CachingSource<S> {
    pub fn new(inner: S, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache: CachedSource::new(cache_path),
            refresh: false,
        }
    }

    /// Always fetch from the inner source, overwriting the cache
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn cache_path(&self) -> &Path {
        self.cache.path()
    }
}

impl<S: RowSource> RowSource for CachingSource<S> {
    fn fetch(&self) -> Result<QueryResults> {
        if !self.refresh && self.cache.exists() {
            return self.cache.fetch();
        }

        let results = self.inner.fetch()?;
        results.save(self.cache.path())?;
        info!(cache = %self.cache.path().display(), "Result saved to cache");
        Ok(results)
    }

    fn describe(&self) -> String {
        format!("{} (cached at {})", self.inner.describe(), self.cache.path().display())
    }
}
